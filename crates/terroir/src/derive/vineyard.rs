//! Vineyard sheet derivations.

use super::{add, count_positive, marker_flags, or_zero, ratio, scale, some, sum, PERFORM_MARKER};
use crate::classify::{climate, vineyard_band};
use crate::error::Result;
use crate::input::{RowTable, Value};

/// Column names read or written by the vineyard derivations and checks.
pub mod col {
    pub const REGION: &str = "GI Region";
    pub const RED_GRAPES: &str = "Red grapes";
    pub const WHITE_GRAPES: &str = "White grapes";
    pub const HARVESTED: &str = "Grapes harvested";
    pub const NEW_DEVELOPMENT: &str = "New development / redevelopment";
    pub const LIVESTOCK: &str = "Livestock grazing";
    pub const DIESEL_LITRES: &str = "Diesel (L)";
    pub const GRID_ELECTRICITY: &str = "Electricity from the grid";
    pub const SOLAR_KWH: &str = "Solar.1";
    pub const IRRIGATION_DIESEL: &str = "Diesel";
    pub const IRRIGATION_ELECTRIC: &str = "Electricity";
    pub const IRRIGATION_SOLAR: &str = "Solar";
    pub const UNDERVINE_OTHER: &str = "Other";
    pub const UNDERVINE_OTHER_DETAIL: &str =
        "If you selected other, please tell us what you are using undervine";
    pub const NOT_HARVESTED_QUESTION: &str = "Was any of your vineyard NOT harvested last season?";

    pub const TOTAL_AREA: &str = "Total Vineyard Area";
    pub const YIELD_PER_HA: &str = "t/ha";
    pub const TOTAL_WATER: &str = "Total water used";
    pub const WATER_PER_HA: &str = "ml/ha";
    pub const WATER_PER_TONNE: &str = "ml/t";
    pub const TOTAL_IRRIGATION: &str = "total irrigation";
    pub const TOTAL_FUEL: &str = "total fuel";
    pub const FUEL_PER_TONNE: &str = "fuel / t";
    pub const PASSES: &str = "#No. Passes";
    pub const APPLIED_FERTILISER: &str = "Applied Fertiliser";
    pub const FERTILISER_PER_HA: &str = "fertiliser/ha";
    pub const FERTILISER_PER_TONNE: &str = "fertiliser/tonnes";
    pub const TOTAL_COVER: &str = "total cover";
    pub const IRRIGATION_COUNT: &str = "irrigation count";
    pub const IRRIGATION_SHARE: &str = "irrigation%";
    pub const AREA_NOT_HARVESTED: &str = "area not harvested";
    pub const CLIMATE: &str = "Climate";
    pub const ACTIVITIES: &str = "activities performed";
}

pub const WATER_SOURCES: &[&str] = &[
    "River water",
    "Groundwater",
    "Surface water dam",
    "Recycled water from winery",
    "Recycled water from other source",
    "Mains water",
    "Other water",
    "Water applied for frost control",
];

pub const IRRIGATION_TYPES: &[&str] = &[
    "Irrigation type - Dripper",
    "Irrigation type - Undervine Sprinkler",
    "Irrigation type - Overhead Sprinkler",
    "Irrigation type - Flood",
    "Irrigation type - Non-irrigated",
];

pub const FUELS: &[&str] = &["Petrol (L)", "LPG (L)", "Diesel (L)", "Biodiesel (L)"];

pub const PASS_COUNTS: &[&str] = &[
    "Slashing Number of times/passes per year",
    "Fungicide spraying Number of times/passes per year",
    "Insecticide spraying Number of times/passes per year",
    "Herbicide spraying Number of times/passes per year",
];

pub const FERTILISER_APPLICATIONS: &[&str] = &[
    "Applied",
    "Applied.1",
    "Applied.2",
    "Applied.3",
    "Applied.4",
    "Applied.5",
];

pub const GROUND_COVER: &[&str] = &[
    "Annual cover crop",
    "Permanent cover crop non native",
    "Permanent cover crop volunteer sward",
    "Permanent cover crop - native",
    "Bare soil",
];

pub const NOT_HARVESTED: &[&str] = &[
    "Frost",
    "Non-sale",
    "New development / redevelopment",
    "Pest/disease",
];

/// Activity questions answered "We perform" or with a contractor option.
pub const ACTIVITIES: &[&str] = &[
    "Mechanical harvesting",
    "Mechanical pruning",
    "Slashing",
    "Fungicide spraying",
    "Insecticide spraying",
    "Herbicide spraying",
];

/// Raw columns the check metrics and vineyard checks read.
pub fn check_input_columns() -> Vec<&'static str> {
    let mut columns = vec![
        col::REGION,
        col::RED_GRAPES,
        col::WHITE_GRAPES,
        col::HARVESTED,
        col::LIVESTOCK,
        col::GRID_ELECTRICITY,
        col::SOLAR_KWH,
        col::IRRIGATION_DIESEL,
        col::IRRIGATION_ELECTRIC,
        col::IRRIGATION_SOLAR,
        col::UNDERVINE_OTHER,
        col::UNDERVINE_OTHER_DETAIL,
        col::NOT_HARVESTED_QUESTION,
    ];
    for group in [
        WATER_SOURCES,
        IRRIGATION_TYPES,
        FUELS,
        PASS_COUNTS,
        FERTILISER_APPLICATIONS,
        GROUND_COVER,
        NOT_HARVESTED,
        ACTIVITIES,
    ] {
        columns.extend_from_slice(group);
    }
    columns
}

/// Compute the columns the vineyard checks read.
pub fn derive_check_metrics(table: &mut RowTable) -> Result<()> {
    let harvested = table.filled(col::HARVESTED)?;

    let area = sum(table, &[col::RED_GRAPES, col::WHITE_GRAPES])?;
    table.insert_numbers(col::TOTAL_AREA, some(area.clone()))?;
    table.insert_numbers(col::YIELD_PER_HA, ratio(&harvested, &area))?;

    let water = sum(table, WATER_SOURCES)?;
    table.insert_numbers(col::TOTAL_WATER, some(water.clone()))?;
    table.insert_numbers(col::WATER_PER_HA, ratio(&water, &area))?;
    table.insert_numbers(col::WATER_PER_TONNE, ratio(&water, &harvested))?;

    let irrigation = sum(table, IRRIGATION_TYPES)?;
    table.insert_numbers(col::TOTAL_IRRIGATION, some(irrigation.clone()))?;

    let fuel = sum(table, FUELS)?;
    table.insert_numbers(col::TOTAL_FUEL, some(fuel.clone()))?;
    table.insert_numbers(col::FUEL_PER_TONNE, ratio(&fuel, &harvested))?;

    let passes = sum(table, PASS_COUNTS)?;
    table.insert_numbers(col::PASSES, some(passes))?;

    let fertiliser = sum(table, FERTILISER_APPLICATIONS)?;
    table.insert_numbers(col::APPLIED_FERTILISER, some(fertiliser.clone()))?;
    table.insert_numbers(col::FERTILISER_PER_HA, ratio(&fertiliser, &area))?;
    table.insert_numbers(col::FERTILISER_PER_TONNE, ratio(&fertiliser, &harvested))?;

    let cover = sum(table, GROUND_COVER)?;
    table.insert_numbers(col::TOTAL_COVER, some(cover))?;

    let irrigation_count = count_positive(table, IRRIGATION_TYPES)?;
    table.insert_numbers(col::IRRIGATION_COUNT, some(irrigation_count))?;
    table.insert_numbers(col::IRRIGATION_SHARE, ratio(&irrigation, &area))?;

    let not_harvested = sum(table, NOT_HARVESTED)?;
    table.insert_numbers(col::AREA_NOT_HARVESTED, some(not_harvested))?;

    let zones: Vec<Value> = table
        .column(col::REGION)?
        .iter()
        .map(|v| Value::Text(climate(v.as_text()).label().to_string()))
        .collect();
    table.insert_column(col::CLIMATE, zones)?;

    let activities = count_activities(table)?;
    table.insert_numbers(col::ACTIVITIES, some(activities))?;

    Ok(())
}

/// Number of activities each member performs themselves.
fn count_activities(table: &RowTable) -> Result<Vec<f64>> {
    let mut counts = vec![0.0; table.len()];
    for column in ACTIVITIES {
        let flags = marker_flags(table, column, PERFORM_MARKER)?;
        for (acc, performed) in counts.iter_mut().zip(flags) {
            if performed {
                *acc += 1.0;
            }
        }
    }
    Ok(counts)
}

/// Column names written by the sustainability derivations.
pub mod metric {
    pub const SIZE_BAND: &str = "Vineyard Size";
    pub const YIELD_HARVESTED_AREA: &str = "t/ha harvested from";
    pub const SHARE_NOT_HARVESTED: &str = "share of area not harvested";
    pub const ELECTRICITY_CO2E: &str = "Electricity kg CO2e";
    pub const ELECTRICITY_TONNES_CO2E: &str = "Electricity in tonnes of CO2e";
    pub const ELECTRICITY_CO2E_HA: &str = "Electricity kg CO2e/ha";
    pub const ELECTRICITY_CO2E_T: &str = "Electricity kg CO2e/t";
    pub const TOTAL_FUEL_CO2E: &str = "Total fuel kg CO2e";
    pub const TOTAL_FUEL_CO2E_HA: &str = "Total fuel kg CO2e/ha";
    pub const TOTAL_FUEL_CO2E_T: &str = "Total fuel kg CO2e/t";
    pub const ENERGY_CO2E_HA: &str = "Total elect + fuel kg CO2e/ha";
    pub const FUEL_T_PLUS_ELECTRICITY_TONNES: &str = "Fuel kg CO2e/t + electricity t CO2e";
    pub const RENEWABLE_ELECTRICITY: &str = "Total renewable electricity (kWh)";
    pub const SYNTHETIC_N_CO2: &str = "Synthetic nitrogen kg CO2";
    pub const SYNTHETIC_N_CO2_T: &str = "Synthetic nitrogen kg CO2/t";
    pub const ORGANIC_N_CO2: &str = "Organic nitrogen kg CO2";
    pub const ORGANIC_N_CO2_T: &str = "Organic nitrogen kg CO2/t";
    pub const UREA_CO2: &str = "Urea kg CO2";
    pub const TOTAL_N_CO2: &str = "Total Nitrogen kg CO2";
    pub const TOTAL_N_CO2_HA: &str = "Total Nitrogen kg CO2/ha";
    pub const TOTAL_N_CO2_T: &str = "Total Nitrogen kg CO2/t";
    pub const EMISSIONS_HA: &str = "Total emissions kg CO2e/ha";
    pub const EMISSIONS_HA_PER_TONNE: &str = "Total emissions kg CO2e/ha per tonne";
    pub const GROSS_MARGIN: &str = "Gross margin";
    pub const COST_PER_HA: &str = "Average operating cost per hectare";
    pub const COST_PER_TONNE: &str = "Average operating cost per tonne";
    pub const POST_RECYCLING: &str = "recycle vs landfill";
}

/// kg CO2e per kWh of grid electricity.
pub const GRID_ELECTRICITY_FACTOR: f64 = 0.51;

/// kg CO2e per litre, by fuel column.
pub const FUEL_FACTORS: &[(&str, &str, f64)] = &[
    ("Petrol (L)", "Petrol", 2.289),
    ("LPG (L)", "LPG", 1.578),
    ("Diesel (L)", "Diesel", 2.694),
    ("Biodiesel (L)", "Biodiesel", 0.123),
];

pub const NITROGEN_FACTOR: f64 = 3.98;
pub const UREA_FACTOR: f64 = 0.733;

pub const RENEWABLE_SOURCES: &[&str] = &[
    "Renewable energy sourced from the grid",
    "Solar.1",
    "Wind",
    "Renewable electricity generated and exported to the grid",
];

const SYNTHETIC_NITROGEN: &str = "Synthetic nitrogen";
const ORGANIC_NITROGEN: &str = "Organic nitrogen";
const UREA: &str = "Urea";
const REVENUE: &str = "Total vineyard revenue (from grape sales)";
const OPERATING_COSTS: &str = "Total vineyard operating costs";
const POSTS_REUSED: &str =
    "How many timber trellis posts have been re-used or recycled in the past 12 months?";
const POSTS_DISPOSED: &str =
    "How many posts have been disposed (e.g. landfill/combustion) in the past 12 months?";

/// Optional input; the survey has no formula for it, so emissions per
/// hectare stay missing unless the sheet supplies the column.
pub const NITROGEN_USE_PER_HA: &str = "Total Nitrogen fertiliser use (kg N applied/ha)";

/// Raw columns read by the sustainability derivations.
pub fn sustainability_input_columns() -> Vec<&'static str> {
    let mut columns = vec![
        col::GRID_ELECTRICITY,
        SYNTHETIC_NITROGEN,
        ORGANIC_NITROGEN,
        UREA,
        REVENUE,
        OPERATING_COSTS,
        POSTS_REUSED,
        POSTS_DISPOSED,
    ];
    columns.extend(FUEL_FACTORS.iter().map(|(c, _, _)| *c));
    columns.extend(RENEWABLE_SOURCES.iter().filter(|c| **c != col::SOLAR_KWH));
    columns
}

/// Compute the emissions, energy and cost metrics reported per member.
///
/// Requires [`derive_check_metrics`] to have run.
pub fn derive_sustainability_metrics(table: &mut RowTable) -> Result<()> {
    let area = table.filled(col::TOTAL_AREA)?;
    let harvested = table.filled(col::HARVESTED)?;
    let not_harvested = table.filled(col::AREA_NOT_HARVESTED)?;

    let bands: Vec<Option<f64>> = table
        .numbers(col::TOTAL_AREA)?
        .into_iter()
        .map(|ha| vineyard_band(ha.filter(|h| *h != 0.0)).map(f64::from))
        .collect();
    table.insert_numbers(metric::SIZE_BAND, bands)?;

    let harvested_area: Vec<f64> = area.iter().zip(&not_harvested).map(|(a, n)| a - n).collect();
    table.insert_numbers(metric::YIELD_HARVESTED_AREA, ratio(&harvested, &harvested_area))?;
    table.insert_numbers(metric::SHARE_NOT_HARVESTED, ratio(&not_harvested, &area))?;

    // Electricity
    let electricity = scale(&table.filled(col::GRID_ELECTRICITY)?, GRID_ELECTRICITY_FACTOR);
    let electricity_tonnes = scale(&electricity, 1.0 / 1000.0);
    let electricity_ha = ratio(&electricity, &area);
    table.insert_numbers(metric::ELECTRICITY_CO2E, some(electricity.clone()))?;
    table.insert_numbers(metric::ELECTRICITY_TONNES_CO2E, some(electricity_tonnes.clone()))?;
    table.insert_numbers(metric::ELECTRICITY_CO2E_HA, electricity_ha.clone())?;
    table.insert_numbers(metric::ELECTRICITY_CO2E_T, ratio(&electricity, &harvested))?;

    // Fuels
    let mut fuel_total = vec![0.0; table.len()];
    let mut fuel_ha = vec![0.0; table.len()];
    let mut fuel_t = vec![0.0; table.len()];
    for (column, label, factor) in FUEL_FACTORS {
        let co2e = scale(&table.filled(column)?, *factor);
        let per_ha = ratio(&co2e, &area);
        let per_t = ratio(&co2e, &harvested);

        fuel_total = add(&fuel_total, &co2e);
        fuel_ha = add(&fuel_ha, &or_zero(&per_ha));
        fuel_t = add(&fuel_t, &or_zero(&per_t));

        table.insert_numbers(format!("{} kg CO2e", label), some(co2e))?;
        table.insert_numbers(format!("{} kg CO2e/ha", label), per_ha)?;
        table.insert_numbers(format!("{} kg CO2e/t", label), per_t)?;
    }
    table.insert_numbers(metric::TOTAL_FUEL_CO2E, some(fuel_total))?;
    table.insert_numbers(metric::TOTAL_FUEL_CO2E_HA, some(fuel_ha.clone()))?;
    table.insert_numbers(metric::TOTAL_FUEL_CO2E_T, some(fuel_t.clone()))?;

    let energy_ha = add(&fuel_ha, &or_zero(&electricity_ha));
    table.insert_numbers(metric::ENERGY_CO2E_HA, some(energy_ha.clone()))?;
    // Mixed units, kept as the survey workbook computes it
    table.insert_numbers(
        metric::FUEL_T_PLUS_ELECTRICITY_TONNES,
        some(add(&fuel_t, &electricity_tonnes)),
    )?;

    let renewable = sum(table, RENEWABLE_SOURCES)?;
    table.insert_numbers(metric::RENEWABLE_ELECTRICITY, some(renewable))?;

    // Nitrogen
    let synthetic = scale(&table.filled(SYNTHETIC_NITROGEN)?, NITROGEN_FACTOR);
    let organic = scale(&table.filled(ORGANIC_NITROGEN)?, NITROGEN_FACTOR);
    let urea = scale(&table.filled(UREA)?, UREA_FACTOR);
    let nitrogen = add(&add(&synthetic, &organic), &urea);
    table.insert_numbers(metric::SYNTHETIC_N_CO2_T, ratio(&synthetic, &harvested))?;
    table.insert_numbers(metric::ORGANIC_N_CO2_T, ratio(&organic, &harvested))?;
    table.insert_numbers(metric::SYNTHETIC_N_CO2, some(synthetic))?;
    table.insert_numbers(metric::ORGANIC_N_CO2, some(organic))?;
    table.insert_numbers(metric::UREA_CO2, some(urea))?;
    table.insert_numbers(metric::TOTAL_N_CO2_HA, ratio(&nitrogen, &area))?;
    table.insert_numbers(metric::TOTAL_N_CO2_T, ratio(&nitrogen, &harvested))?;
    table.insert_numbers(metric::TOTAL_N_CO2, some(nitrogen))?;

    let emissions_ha: Vec<Option<f64>> = if table.has_column(NITROGEN_USE_PER_HA) {
        some(add(&table.filled(NITROGEN_USE_PER_HA)?, &energy_ha))
    } else {
        vec![None; table.len()]
    };
    let emissions_per_tonne: Vec<Option<f64>> = emissions_ha
        .iter()
        .zip(&harvested)
        .map(|(e, h)| e.and_then(|e| if *h == 0.0 { None } else { Some(e / h) }))
        .collect();
    table.insert_numbers(metric::EMISSIONS_HA, emissions_ha)?;
    table.insert_numbers(metric::EMISSIONS_HA_PER_TONNE, emissions_per_tonne)?;

    // Costs
    let revenue = table.filled(REVENUE)?;
    let costs = table.filled(OPERATING_COSTS)?;
    let margin: Vec<f64> = revenue.iter().zip(&costs).map(|(r, c)| r - c).collect();
    table.insert_numbers(metric::GROSS_MARGIN, some(margin))?;
    table.insert_numbers(metric::COST_PER_HA, ratio(&costs, &area))?;
    table.insert_numbers(metric::COST_PER_TONNE, ratio(&costs, &harvested))?;

    let reused = table.filled(POSTS_REUSED)?;
    let disposed = table.filled(POSTS_DISPOSED)?;
    table.insert_numbers(metric::POST_RECYCLING, ratio(&reused, &disposed))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MemberId;

    fn blank_sheet(rows: usize, columns: &[&str]) -> RowTable {
        let ids = (1..=rows as u64).map(MemberId).collect();
        let mut table = RowTable::new(ids).unwrap();
        for column in columns {
            table.insert_column(*column, vec![Value::Missing; rows]).unwrap();
        }
        table
    }

    fn set(table: RowTable, column: &str, values: Vec<Value>) -> RowTable {
        let names: Vec<String> = table.column_names().map(String::from).collect();
        let mut rebuilt = RowTable::new(table.ids().to_vec()).unwrap();
        for name in names {
            let col = if name == column {
                values.clone()
            } else {
                table.column(&name).unwrap().to_vec()
            };
            rebuilt.insert_column(name, col).unwrap();
        }
        rebuilt
    }

    fn n(v: f64) -> Value {
        Value::Number(v)
    }

    #[test]
    fn test_check_metrics() {
        let mut table = blank_sheet(2, &check_input_columns());
        table = set(table, col::RED_GRAPES, vec![n(6.0), Value::Missing]);
        table = set(table, col::WHITE_GRAPES, vec![n(4.0), Value::Missing]);
        table = set(table, col::HARVESTED, vec![n(50.0), n(10.0)]);
        table = set(table, "River water", vec![n(20.0), Value::Missing]);
        table = set(table, "Mains water", vec![n(5.0), Value::Missing]);
        table = set(table, "Irrigation type - Dripper", vec![n(10.0), Value::Missing]);
        table = set(table, col::REGION, vec![Value::Text("Barossa Valley".into()), Value::Missing]);
        table = set(
            table,
            "Slashing",
            vec![Value::Text("We perform".into()), Value::Text("Contractor".into())],
        );

        derive_check_metrics(&mut table).unwrap();
        table.blank_zeros();

        assert_eq!(table.get(0, col::TOTAL_AREA), Some(&n(10.0)));
        assert_eq!(table.get(0, col::YIELD_PER_HA), Some(&n(5.0)));
        assert_eq!(table.get(0, col::TOTAL_WATER), Some(&n(25.0)));
        assert_eq!(table.get(0, col::WATER_PER_HA), Some(&n(2.5)));
        assert_eq!(table.get(0, col::WATER_PER_TONNE), Some(&n(0.5)));
        assert_eq!(table.get(0, col::IRRIGATION_COUNT), Some(&n(1.0)));
        assert_eq!(table.get(0, col::IRRIGATION_SHARE), Some(&n(1.0)));
        assert_eq!(table.get(0, col::ACTIVITIES), Some(&n(1.0)));
        assert_eq!(
            table.get(0, col::CLIMATE),
            Some(&Value::Text("Warm Very Dry".into()))
        );

        // No area: totals blank to missing, ratios never divide by zero
        assert_eq!(table.get(1, col::TOTAL_AREA), Some(&Value::Missing));
        assert_eq!(table.get(1, col::YIELD_PER_HA), Some(&Value::Missing));
        assert_eq!(table.get(1, col::ACTIVITIES), Some(&Value::Missing));
        assert_eq!(
            table.get(1, col::CLIMATE),
            Some(&Value::Text("Unknown Climate".into()))
        );
    }

    #[test]
    fn test_check_metrics_missing_column() {
        let mut columns = check_input_columns();
        columns.retain(|c| *c != "Groundwater");
        let mut table = blank_sheet(1, &columns);
        let err = derive_check_metrics(&mut table).unwrap_err();
        assert!(err.to_string().contains("Groundwater"));
    }

    #[test]
    fn test_sustainability_metrics() {
        let mut columns = check_input_columns();
        columns.extend(sustainability_input_columns());
        columns.sort();
        columns.dedup();
        let mut table = blank_sheet(1, &columns);
        table = set(table, col::RED_GRAPES, vec![n(10.0)]);
        table = set(table, col::HARVESTED, vec![n(100.0)]);
        table = set(table, col::GRID_ELECTRICITY, vec![n(1000.0)]);
        table = set(table, "Diesel (L)", vec![n(100.0)]);
        table = set(table, "Urea", vec![n(10.0)]);

        derive_check_metrics(&mut table).unwrap();
        derive_sustainability_metrics(&mut table).unwrap();
        table.blank_zeros();

        let get = |c: &str| table.get(0, c).and_then(Value::as_number);
        assert_eq!(get(metric::SIZE_BAND), Some(2.0));
        assert_eq!(get(metric::ELECTRICITY_CO2E), Some(510.0));
        assert_eq!(get(metric::ELECTRICITY_CO2E_HA), Some(51.0));
        assert!((get("Diesel kg CO2e").unwrap() - 269.4).abs() < 1e-9);
        assert!((get(metric::ENERGY_CO2E_HA).unwrap() - (51.0 + 26.94)).abs() < 1e-9);
        assert!((get(metric::UREA_CO2).unwrap() - 7.33).abs() < 1e-9);
        // No nitrogen-use input column: emissions stay missing
        assert_eq!(get(metric::EMISSIONS_HA), None);
    }
}
