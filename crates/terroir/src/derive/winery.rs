//! Winery sheet derivations.

use super::{ratio, scale, some, sum};
use crate::classify::winery_size;
use crate::error::Result;
use crate::input::{RowTable, Value};

/// Column names read or written by the winery derivations and checks.
pub mod col {
    pub const TONNES_CRUSHED: &str = "Tonnes crushed";
    pub const FULL_WINEMAKING: &str = "Full winemaking";
    pub const FIRST_STAGE: &str = "First stage winemaking";
    pub const FINAL_STAGE: &str = "Final stage winemaking";
    pub const WATER_USED: &str = "Water used";
    pub const WASTEWATER: &str = "Wastewater generated";
    pub const GRID_ELECTRICITY: &str = "Electricity from the grid";
    pub const SOLAR: &str = "Solar";

    pub const EXTRACTION: &str = "% Extraction";
    pub const WATER_PER_TONNE: &str = "water / crushed";
    pub const LITRES_OF_WINE: &str = "litre of wine";
    pub const WATER_PER_LITRE: &str = "water / litre of wine";
    pub const ELECTRICITY: &str = "electricity";
    pub const ELECTRICITY_PER_TONNE: &str = "electricity / tonne";
    pub const ELECTRICITY_PER_LITRE: &str = "electricity / litre of wine";
    pub const FUEL_CO2E: &str = "fuel CO2e";
    pub const FUEL_CO2E_PER_TONNE: &str = "fuel CO2e / tonne crushed";
    pub const WASTEWATER_RATIO: &str = "wastewater / water used";
    pub const SIZE: &str = "Size";
}

pub const ELECTRICITY_SOURCES: &[&str] = &[
    "Other",
    "Wind",
    "Solar",
    "Renewable energy from the grid",
    "Electricity from the grid",
];

/// kg CO2e per unit of each fuel column.
pub const FUEL_FACTORS: &[(&str, f64)] = &[
    ("Petrol (L)", 2.289),
    ("Diesel (L)", 2.694),
    ("Natural gas", 51.348),
    ("LPG", 1.578),
];

pub const REFRIGERANTS: &[&str] = &[
    "Refrigerant",
    "Refrigerant.1",
    "Refrigerant.2",
    "Refrigerant.3",
    "Refrigerant.4",
];

/// Raw columns the winery check metrics and checks read.
pub fn check_input_columns() -> Vec<&'static str> {
    let mut columns = vec![
        col::TONNES_CRUSHED,
        col::FULL_WINEMAKING,
        col::FIRST_STAGE,
        col::FINAL_STAGE,
        col::WATER_USED,
        col::WASTEWATER,
    ];
    columns.extend_from_slice(ELECTRICITY_SOURCES);
    columns.extend(FUEL_FACTORS.iter().map(|(c, _)| *c));
    columns.extend_from_slice(REFRIGERANTS);
    columns
}

/// Compute the columns the winery checks read.
pub fn derive_check_metrics(table: &mut RowTable) -> Result<()> {
    let crushed = table.filled(col::TONNES_CRUSHED)?;
    let full = table.filled(col::FULL_WINEMAKING)?;
    let water = table.filled(col::WATER_USED)?;

    table.insert_numbers(col::EXTRACTION, ratio(&full, &crushed))?;
    table.insert_numbers(col::WATER_PER_TONNE, ratio(&water, &crushed))?;

    let litres = sum(
        table,
        &[col::FULL_WINEMAKING, col::FIRST_STAGE, col::FINAL_STAGE],
    )?;
    table.insert_numbers(col::LITRES_OF_WINE, some(litres.clone()))?;
    table.insert_numbers(col::WATER_PER_LITRE, ratio(&water, &litres))?;

    let electricity = sum(table, ELECTRICITY_SOURCES)?;
    table.insert_numbers(col::ELECTRICITY, some(electricity.clone()))?;
    table.insert_numbers(col::ELECTRICITY_PER_TONNE, ratio(&electricity, &crushed))?;
    table.insert_numbers(col::ELECTRICITY_PER_LITRE, ratio(&electricity, &litres))?;

    let mut fuel = vec![0.0; table.len()];
    for (column, factor) in FUEL_FACTORS {
        for (acc, v) in fuel.iter_mut().zip(scale(&table.filled(column)?, *factor)) {
            *acc += v;
        }
    }
    table.insert_numbers(col::FUEL_CO2E, some(fuel.clone()))?;
    table.insert_numbers(col::FUEL_CO2E_PER_TONNE, ratio(&fuel, &crushed))?;

    let wastewater = table.filled(col::WASTEWATER)?;
    table.insert_numbers(col::WASTEWATER_RATIO, ratio(&wastewater, &water))?;

    // Unreported tonnage counts as zero, which sizes the winery as Small
    let sizes: Vec<Value> = crushed
        .iter()
        .map(|t| Value::Text(winery_size(Some(*t)).label().to_string()))
        .collect();
    table.insert_column(col::SIZE, sizes)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MemberId;

    #[test]
    fn test_winery_metrics() {
        let columns = check_input_columns();
        let mut table = RowTable::new(vec![MemberId(3), MemberId(9)]).unwrap();
        for column in &columns {
            let values = match *column {
                col::TONNES_CRUSHED => vec![Value::Number(1000.0), Value::Missing],
                col::FULL_WINEMAKING => vec![Value::Number(600.0), Value::Missing],
                col::WATER_USED => vec![Value::Number(2000.0), Value::Number(50.0)],
                col::WASTEWATER => vec![Value::Number(1500.0), Value::Missing],
                "Diesel (L)" => vec![Value::Number(10.0), Value::Missing],
                "Electricity from the grid" => vec![Value::Number(300.0), Value::Missing],
                _ => vec![Value::Missing, Value::Missing],
            };
            table.insert_column(*column, values).unwrap();
        }

        derive_check_metrics(&mut table).unwrap();
        table.blank_zeros();

        let get = |row: usize, c: &str| table.get(row, c).and_then(Value::as_number);
        assert_eq!(get(0, col::EXTRACTION), Some(0.6));
        assert_eq!(get(0, col::WATER_PER_TONNE), Some(2.0));
        assert_eq!(get(0, col::ELECTRICITY_PER_TONNE), Some(0.3));
        assert_eq!(get(0, col::WASTEWATER_RATIO), Some(0.75));
        assert!((get(0, col::FUEL_CO2E).unwrap() - 26.94).abs() < 1e-9);
        assert_eq!(
            table.get(0, col::SIZE),
            Some(&Value::Text("Medium".to_string()))
        );

        assert_eq!(get(1, col::FUEL_CO2E), None);
        assert_eq!(get(1, col::WATER_PER_TONNE), None);
        assert_eq!(
            table.get(1, col::SIZE),
            Some(&Value::Text("Small".to_string()))
        );
    }
}
