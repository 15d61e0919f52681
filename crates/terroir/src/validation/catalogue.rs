//! The per-section list of checks, in report column order.

use super::check::Check;
use super::consistency::{approx_eq, round_to, Operand, PairRule, PredicateRule};
use super::outlier::{Grouping, OutlierCheck, OutlierConfig};
use crate::classify::WinerySize;
use crate::derive::{vineyard, winery};
use crate::section::Section;

use vineyard::col as v;
use winery::col as w;

/// Columns standardized within GI region and climate zone.
pub const VINEYARD_OUTLIER_COLUMNS: &[&str] = &[
    v::YIELD_PER_HA,
    v::WATER_PER_HA,
    v::WATER_PER_TONNE,
    v::FUEL_PER_TONNE,
    v::PASSES,
    v::FERTILISER_PER_HA,
    v::FERTILISER_PER_TONNE,
    v::IRRIGATION_SHARE,
];

/// Columns standardized within size class and across the whole sheet.
pub const WINERY_OUTLIER_COLUMNS: &[&str] = &[
    w::EXTRACTION,
    w::WATER_PER_TONNE,
    w::WATER_PER_LITRE,
    w::ELECTRICITY_PER_TONNE,
    w::ELECTRICITY_PER_LITRE,
    w::FUEL_CO2E_PER_TONNE,
    w::WASTEWATER_RATIO,
];

/// Build the ordered check list for a section.
pub fn checks_for(section: Section, config: &OutlierConfig) -> Vec<Box<dyn Check>> {
    match section {
        Section::Vineyard => vineyard_checks(config),
        Section::Winery => winery_checks(config),
    }
}

pub fn vineyard_checks(config: &OutlierConfig) -> Vec<Box<dyn Check>> {
    let mut checks: Vec<Box<dyn Check>> = VINEYARD_OUTLIER_COLUMNS
        .iter()
        .map(|column| {
            Box::new(OutlierCheck::new(
                format!("Unusual {}", column),
                *column,
                Grouping::column(v::REGION),
                Grouping::column(v::CLIMATE),
                *config,
            )) as Box<dyn Check>
        })
        .collect();

    checks.push(Box::new(PairRule::one_way(
        "Using water without irrigation",
        Operand::present(v::TOTAL_WATER),
        v::TOTAL_IRRIGATION,
    )));
    checks.push(Box::new(PredicateRule::new(
        "Using percentages instead of ha/ml",
        "irrigated area of exactly 100 or 1 when the vineyard area differs",
        &[v::TOTAL_IRRIGATION, v::TOTAL_AREA],
        |row| {
            let Some(irrigated) = row.number(v::TOTAL_IRRIGATION) else {
                return false;
            };
            let area = row.number(v::TOTAL_AREA);
            [100.0, 1.0]
                .iter()
                .any(|p| approx_eq(irrigated, *p) && !area.is_some_and(|a| approx_eq(a, *p)))
        },
    )));
    checks.push(Box::new(PredicateRule::new(
        "Not included developed hectares",
        "vineyard area plus new development equals the irrigated or ground cover area",
        &[v::TOTAL_AREA, v::NEW_DEVELOPMENT, v::TOTAL_IRRIGATION, v::TOTAL_COVER],
        |row| {
            let (Some(area), Some(developed)) =
                (row.number(v::TOTAL_AREA), row.number(v::NEW_DEVELOPMENT))
            else {
                return false;
            };
            let total = area + developed;
            [v::TOTAL_IRRIGATION, v::TOTAL_COVER]
                .iter()
                .filter_map(|c| row.number(c))
                .any(|x| approx_eq(x, total))
        },
    )));
    checks.push(Box::new(PredicateRule::new(
        "Area irrigated entered as ML used",
        "water used equals irrigated area while water per hectare is not 1",
        &[v::TOTAL_WATER, v::TOTAL_IRRIGATION, v::TOTAL_AREA],
        |row| {
            let (Some(water), Some(irrigated)) =
                (row.number(v::TOTAL_WATER), row.number(v::TOTAL_IRRIGATION))
            else {
                return false;
            };
            let area = row.number(v::TOTAL_AREA);
            approx_eq(water, irrigated) && !area.is_some_and(|a| approx_eq(a / water, 1.0))
        },
    )));
    checks.push(Box::new(PredicateRule::new(
        "Irrigated land does not add up to ha of crop",
        "irrigated area below vineyard area",
        &[v::TOTAL_IRRIGATION, v::TOTAL_AREA],
        |row| matches!(
            (row.number(v::TOTAL_IRRIGATION), row.number(v::TOTAL_AREA)),
            (Some(irrigated), Some(area)) if irrigated < area && !approx_eq(irrigated, area)
        ),
    )));
    checks.push(Box::new(PredicateRule::new(
        "Irrigated area below 100% when using single system",
        "one irrigation system whose area differs from the vineyard area",
        &[v::IRRIGATION_COUNT, v::TOTAL_IRRIGATION, v::TOTAL_AREA],
        |row| {
            let (Some(count), Some(irrigated)) =
                (row.number(v::IRRIGATION_COUNT), row.number(v::TOTAL_IRRIGATION))
            else {
                return false;
            };
            let area = row.number(v::TOTAL_AREA);
            approx_eq(count, 1.0) && !area.is_some_and(|a| approx_eq(irrigated, round_to(a, 3)))
        },
    )));
    checks.push(Box::new(PredicateRule::new(
        "area not harvested was more than total area",
        "area not harvested exceeds vineyard area",
        &[v::AREA_NOT_HARVESTED, v::TOTAL_AREA],
        |row| matches!(
            (row.number(v::AREA_NOT_HARVESTED), row.number(v::TOTAL_AREA)),
            (Some(unharvested), Some(area)) if unharvested > area && !approx_eq(unharvested, area)
        ),
    )));
    checks.push(Box::new(PredicateRule::new(
        "Irrigated area greater than vineyard area",
        "irrigated area exceeds vineyard area",
        &[v::TOTAL_IRRIGATION, v::TOTAL_AREA],
        |row| matches!(
            (row.number(v::TOTAL_IRRIGATION), row.number(v::TOTAL_AREA)),
            (Some(irrigated), Some(area)) if irrigated > area && !approx_eq(irrigated, area)
        ),
    )));
    checks.push(Box::new(PredicateRule::new(
        "total undervine does not add up to vineyard area",
        "ground cover below vineyard area even allowing for livestock grazing",
        &[v::TOTAL_COVER, v::TOTAL_AREA, v::LIVESTOCK],
        |row| match (row.number(v::TOTAL_COVER), row.number(v::TOTAL_AREA)) {
            (Some(cover), Some(area)) => {
                cover < area
                    && !approx_eq(cover, area)
                    && !approx_eq(cover + row.allowance(v::LIVESTOCK), area)
            }
            _ => false,
        },
    )));
    checks.push(Box::new(PairRule::one_way(
        "Undervine Other is not filled out",
        Operand::present(v::UNDERVINE_OTHER),
        v::UNDERVINE_OTHER_DETAIL,
    )));
    checks.push(Box::new(PairRule::one_way(
        "No fuel and No contractors",
        Operand::present(v::ACTIVITIES),
        v::TOTAL_FUEL,
    )));
    checks.push(Box::new(PairRule::one_way(
        "No Diesel and No contractors",
        Operand::present(v::ACTIVITIES),
        v::DIESEL_LITRES,
    )));
    checks.push(Box::new(PredicateRule::new(
        "No irrigation",
        "no irrigated area reported",
        &[v::TOTAL_IRRIGATION],
        |row| row.is_missing(v::TOTAL_IRRIGATION),
    )));
    checks.push(Box::new(PairRule::one_way(
        "Labelled harvested without yield",
        Operand::equals(v::NOT_HARVESTED_QUESTION, "No"),
        v::HARVESTED,
    )));
    checks.push(Box::new(PairRule::one_way(
        "No electricity from the grid and no Solar",
        Operand::absent(v::GRID_ELECTRICITY),
        v::SOLAR_KWH,
    )));
    checks.push(Box::new(PairRule::one_way(
        "Diesel irrigation and no diesel use",
        Operand::present(v::IRRIGATION_DIESEL),
        v::DIESEL_LITRES,
    )));
    checks.push(Box::new(PairRule::one_way(
        "Electric irrigation and no electricity from grid used",
        Operand::present(v::IRRIGATION_ELECTRIC),
        v::GRID_ELECTRICITY,
    )));
    checks.push(Box::new(PairRule::one_way(
        "Solar irrigation and no solar electricity used",
        Operand::present(v::IRRIGATION_SOLAR),
        v::SOLAR_KWH,
    )));

    checks
}

pub fn winery_checks(config: &OutlierConfig) -> Vec<Box<dyn Check>> {
    let mut checks: Vec<Box<dyn Check>> = WINERY_OUTLIER_COLUMNS
        .iter()
        .map(|column| {
            Box::new(OutlierCheck::new(
                format!("Unusual {} (both)", column),
                *column,
                Grouping::column(w::SIZE),
                Grouping::All,
                *config,
            )) as Box<dyn Check>
        })
        .collect();

    checks.push(Box::new(PairRule::one_way(
        "No electricity from the grid and no Solar",
        Operand::absent(w::GRID_ELECTRICITY),
        w::SOLAR,
    )));

    let mut refrigerant_columns = vec![w::SIZE];
    refrigerant_columns.extend_from_slice(winery::REFRIGERANTS);
    checks.push(Box::new(PredicateRule::new(
        "No Refrigerants (Medium+ size)",
        "medium or large winery reporting no refrigerant",
        &refrigerant_columns,
        |row| {
            let sized = row
                .text(w::SIZE)
                .map(WinerySize::from_label)
                .is_some_and(|size| matches!(size, WinerySize::Medium | WinerySize::Large));
            sized
                && winery::REFRIGERANTS
                    .iter()
                    .map(|c| row.allowance(c))
                    .sum::<f64>()
                    == 0.0
        },
    )));
    checks.push(Box::new(PredicateRule::new(
        "No fuel",
        "no fuel emissions reported",
        &[w::FUEL_CO2E],
        |row| row.is_missing(w::FUEL_CO2E),
    )));

    checks
}
