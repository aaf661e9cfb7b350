//! Rule-based categorical resolution
//!
//! Fills the remaining gaps in CryoSleep, HomePlanet, Destination, Side, Deck
//! and Age with domain rules followed by cascades of group-wise imputation.
//! Each resolver only touches values that earlier rules left missing.

use super::config::PipelineConfig;
use super::derived::{GROUP_SPENT_MONEY, SPENT_MONEY, TOTAL_SPENDING, TRAVELING_ALONE};
use super::imputer::{FillValue, ImputeCascade, ImputeMethod};
use crate::error::Result;
use crate::utils::frame::{numeric_values, put_numeric, put_text, text_values};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Cabin sides the deck rule understands
const SIDES: [&str; 2] = ["P", "S"];

/// Mean TotalSpending per (Side, Deck) over passengers not in cryo sleep.
///
/// Built once per pipeline run, before any categorical value is resolved.
#[derive(Debug, Clone, Default)]
pub struct DeckSpendTable {
    means: HashMap<String, HashMap<String, f64>>,
}

impl DeckSpendTable {
    /// Aggregate the table from a frame holding Side, Deck, CryoSleep and TotalSpending
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let sides = text_values(df, "Side")?;
        let decks = text_values(df, "Deck")?;
        let cryo = numeric_values(df, "CryoSleep")?;
        let totals = numeric_values(df, TOTAL_SPENDING)?;

        let mut sums: HashMap<(String, String), (f64, usize)> = HashMap::new();
        for row in 0..df.height() {
            // Unknown cryo status counts as awake
            if cryo[row] == Some(1.0) {
                continue;
            }
            let (Some(side), Some(deck), Some(total)) = (&sides[row], &decks[row], totals[row]) else {
                continue;
            };
            let entry = sums.entry((side.clone(), deck.clone())).or_insert((0.0, 0));
            entry.0 += total;
            entry.1 += 1;
        }

        let mut table = Self::default();
        for ((side, deck), (sum, count)) in sums {
            table
                .means
                .entry(side)
                .or_default()
                .insert(deck, sum / count as f64);
        }
        Ok(table)
    }

    /// Add mean spends for one side
    pub fn with_side(mut self, side: &str, means: &[(&str, f64)]) -> Self {
        let decks = self.means.entry(side.to_string()).or_default();
        for (deck, mean) in means {
            decks.insert(deck.to_string(), *mean);
        }
        self
    }

    pub fn mean(&self, side: &str, deck: &str) -> Option<f64> {
        self.means.get(side).and_then(|decks| decks.get(deck)).copied()
    }
}

/// Pick the deck whose mean spend on the passenger's side is closest to their own.
///
/// Candidates come from the home planet; decks without a mean for the side are
/// skipped and ties go to the earlier candidate. Returns `None` when the planet
/// is unknown, the side is missing or not P/S, or no candidate has a mean.
pub fn closest_deck(
    home_planet: Option<&str>,
    side: Option<&str>,
    total_spending: Option<f64>,
    config: &PipelineConfig,
    table: &DeckSpendTable,
) -> Option<String> {
    let side = side.filter(|s| SIDES.contains(s))?;
    let total = total_spending?;
    let candidates = config.decks_for(home_planet?)?;

    let mut best: Option<(&str, f64)> = None;
    for deck in candidates {
        let Some(mean) = table.mean(side, deck) else {
            continue;
        };
        let distance = (mean - total).abs();
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((deck.as_str(), distance));
        }
    }
    best.map(|(deck, _)| deck.to_string())
}

/// Applies the categorical rules in order
pub struct CategoricalResolver<'a> {
    config: &'a PipelineConfig,
    deck_spend: &'a DeckSpendTable,
}

impl<'a> CategoricalResolver<'a> {
    pub fn new(config: &'a PipelineConfig, deck_spend: &'a DeckSpendTable) -> Self {
        Self { config, deck_spend }
    }

    /// Resolve CryoSleep, HomePlanet, Destination, Side and Deck, in that order
    pub fn resolve_categoricals(&self, df: &mut DataFrame) -> Result<()> {
        self.resolve_cryo_sleep(df)?;
        self.resolve_home_planet(df)?;
        self.resolve_destination(df)?;
        self.resolve_side(df)?;
        self.resolve_deck(df)?;
        Ok(())
    }

    /// CryoSleep from spending and group rules, then the group mode
    ///
    /// Returns how many values the spending and group rules filled.
    pub fn resolve_cryo_sleep(&self, df: &mut DataFrame) -> Result<usize> {
        let mut cryo = numeric_values(df, "CryoSleep")?;
        let spent = numeric_values(df, SPENT_MONEY)?;
        let alone = numeric_values(df, TRAVELING_ALONE)?;
        let group_spent = numeric_values(df, GROUP_SPENT_MONEY)?;
        let group_size = text_values(df, "GroupSize")?;

        let mut by_rule = 0;
        for row in 0..cryo.len() {
            if cryo[row].is_some() {
                continue;
            }
            if spent[row] == Some(0.0) && alone[row] == Some(1.0) {
                cryo[row] = Some(1.0);
                by_rule += 1;
            } else if spent[row] == Some(1.0) {
                cryo[row] = Some(0.0);
                by_rule += 1;
            }
        }
        for row in 0..cryo.len() {
            if cryo[row].is_none()
                && group_spent[row] == Some(0.0)
                && group_size[row].as_deref() != Some(self.config.single_occupant.as_str())
            {
                cryo[row] = Some(1.0);
                by_rule += 1;
            }
        }
        put_numeric(df, "CryoSleep", cryo)?;

        let by_group = ImputeCascade::new("CryoSleep", ImputeMethod::Mode)
            .then_by(&["GroupId"])
            .run(df)?;
        debug!(by_rule, by_group, "CryoSleep resolved");
        Ok(by_rule)
    }

    /// HomePlanet from the group, the deck, the family, then the cabin block
    pub fn resolve_home_planet(&self, df: &mut DataFrame) -> Result<()> {
        ImputeCascade::new("HomePlanet", ImputeMethod::Mode)
            .then_by(&["GroupId"])
            .run(df)?;

        let mut planets = text_values(df, "HomePlanet")?;
        let decks = text_values(df, "Deck")?;
        let mut by_deck = 0;
        for (planet, deck) in planets.iter_mut().zip(&decks) {
            if planet.is_some() {
                continue;
            }
            let Some(deck) = deck else { continue };
            if self.config.europa_decks.contains(deck) {
                *planet = Some("Europa".to_string());
                by_deck += 1;
            } else if *deck == self.config.earth_deck {
                *planet = Some("Earth".to_string());
                by_deck += 1;
            }
        }
        put_text(df, "HomePlanet", planets)?;

        let filled = ImputeCascade::new("HomePlanet", ImputeMethod::Mode)
            .then_by(&["LastName"])
            .then_by(&["Deck", "Side"])
            .then_overall()
            .run(df)?;
        debug!(by_deck, filled, "HomePlanet resolved");
        Ok(())
    }

    /// Destination from cabin, group and family cascades
    pub fn resolve_destination(&self, df: &mut DataFrame) -> Result<()> {
        let filled = destination_cascade(self.config).run(df)?;
        debug!(filled, "Destination resolved");
        Ok(())
    }

    /// Side from the group, the family, then the travel route
    pub fn resolve_side(&self, df: &mut DataFrame) -> Result<()> {
        let filled = ImputeCascade::new("Side", ImputeMethod::Mode)
            .then_by(&["GroupId"])
            .then_by(&["LastName"])
            .then_by(&["HomePlanet", "Destination"])
            .then_overall()
            .run(df)?;
        debug!(filled, "Side resolved");
        Ok(())
    }

    /// Deck from the closest mean spend among the home planet's decks
    pub fn resolve_deck(&self, df: &mut DataFrame) -> Result<()> {
        let mut decks = text_values(df, "Deck")?;
        let planets = text_values(df, "HomePlanet")?;
        let sides = text_values(df, "Side")?;
        let totals = numeric_values(df, TOTAL_SPENDING)?;

        let mut filled = 0;
        for row in 0..decks.len() {
            if decks[row].is_some() {
                continue;
            }
            decks[row] = closest_deck(
                planets[row].as_deref(),
                sides[row].as_deref(),
                totals[row],
                self.config,
                self.deck_spend,
            );
            filled += usize::from(decks[row].is_some());
        }
        put_text(df, "Deck", decks)?;
        debug!(filled, "Deck resolved");
        Ok(())
    }

    /// Age from the group median, then bucketed into AgeGroup
    pub fn resolve_age(&self, df: &mut DataFrame) -> Result<()> {
        let filled = ImputeCascade::new("Age", ImputeMethod::Median)
            .then_by(&["HomePlanet", "CryoSleep", SPENT_MONEY, TRAVELING_ALONE])
            .then_overall()
            .run(df)?;

        let groups: Vec<Option<String>> = numeric_values(df, "Age")?
            .into_iter()
            .map(|age| age.and_then(|a| self.config.age_label(a)).map(str::to_string))
            .collect();
        put_text(df, "AgeGroup", groups)?;
        debug!(filled, "Age resolved");
        Ok(())
    }
}

fn destination_cascade(config: &PipelineConfig) -> ImputeCascade {
    ImputeCascade::new("Destination", ImputeMethod::Mode)
        .then_by(&["Deck", "CabinNumber", "Side"])
        .then_by(&["Deck", "Side"])
        .then_by(&["GroupId", "LastName"])
        .then_by(&["GroupId"])
        .then_by(&["LastName"])
        .then_overall()
        .then_constant(FillValue::Text(config.default_destination.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn earth_table() -> DeckSpendTable {
        DeckSpendTable::default().with_side("S", &[("E", 100.0), ("F", 50.0), ("G", 10.0)])
    }

    #[test]
    fn test_closest_deck_by_spend() {
        let config = PipelineConfig::default();
        let deck = closest_deck(Some("Earth"), Some("S"), Some(60.0), &config, &earth_table());
        assert_eq!(deck.as_deref(), Some("F"));
    }

    #[test]
    fn test_closest_deck_needs_side() {
        let config = PipelineConfig::default();
        let table = earth_table();
        assert_eq!(closest_deck(Some("Earth"), None, Some(60.0), &config, &table), None);
        assert_eq!(closest_deck(Some("Earth"), Some("X"), Some(60.0), &config, &table), None);
        assert_eq!(closest_deck(Some("Pluto"), Some("S"), Some(60.0), &config, &table), None);
    }

    #[test]
    fn test_closest_deck_skips_decks_without_mean() {
        let config = PipelineConfig::default();
        let table = DeckSpendTable::default().with_side("P", &[("G", 500.0)]);
        let deck = closest_deck(Some("Earth"), Some("P"), Some(0.0), &config, &table);
        assert_eq!(deck.as_deref(), Some("G"));
    }

    #[test]
    fn test_deck_table_excludes_cryo_sleepers() {
        let df = DataFrame::new(vec![
            Column::new("Side".into(), &[Some("P"), Some("P"), Some("P"), None]),
            Column::new("Deck".into(), &["F", "F", "F", "F"]),
            Column::new("CryoSleep".into(), &[Some(0.0), None, Some(1.0), Some(0.0)]),
            Column::new(TOTAL_SPENDING.into(), &[100.0, 50.0, 0.0, 900.0]),
        ])
        .unwrap();

        let table = DeckSpendTable::from_frame(&df).unwrap();
        assert_eq!(table.mean("P", "F"), Some(75.0));
        assert_eq!(table.mean("S", "F"), None);
    }

    fn cryo_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("GroupId".into(), &["1", "2", "3", "3", "4", "4"]),
            Column::new("GroupSize".into(), &["01", "01", "01", "02", "01", "02"]),
            Column::new(
                "CryoSleep".into(),
                &[None, None, None, None, Some(0.0), None],
            ),
            Column::new(SPENT_MONEY.into(), &[0i64, 1, 0, 0, 0, 0]),
            Column::new(TRAVELING_ALONE.into(), &[1i64, 1, 0, 0, 0, 0]),
            Column::new(GROUP_SPENT_MONEY.into(), &[0i64, 1, 0, 0, 1, 1]),
        ])
        .unwrap()
    }

    #[test]
    fn test_cryo_sleep_rules() {
        let config = PipelineConfig::default();
        let table = DeckSpendTable::default();
        let resolver = CategoricalResolver::new(&config, &table);
        let mut df = cryo_frame();

        let by_rule = resolver.resolve_cryo_sleep(&mut df).unwrap();
        let cryo = numeric_values(&df, "CryoSleep").unwrap();

        // Rows 0, 1 and 3; row 4 was already known and row 2 comes from its group
        assert_eq!(by_rule, 3);

        // Alone without spending
        assert_eq!(cryo[0], Some(1.0));
        // Spent money
        assert_eq!(cryo[1], Some(0.0));
        // Silent group, only the non-first member matches the group rule
        assert_eq!(cryo[3], Some(1.0));
        assert_eq!(cryo[2], Some(1.0));
        // Group mode
        assert_eq!(cryo[5], Some(0.0));
    }

    #[test]
    fn test_home_planet_from_deck() {
        let config = PipelineConfig::default();
        let table = DeckSpendTable::default();
        let resolver = CategoricalResolver::new(&config, &table);
        let mut df = DataFrame::new(vec![
            Column::new("GroupId".into(), &["1", "2", "3"]),
            Column::new("LastName".into(), &["Ann", "Bee", "Cee"]),
            Column::new("Deck".into(), &["B", "G", "F"]),
            Column::new("Side".into(), &["P", "P", "P"]),
            Column::new("HomePlanet".into(), &[None, None, Some("Mars")]),
        ])
        .unwrap();

        resolver.resolve_home_planet(&mut df).unwrap();
        let planets = text_values(&df, "HomePlanet").unwrap();
        assert_eq!(planets[0].as_deref(), Some("Europa"));
        assert_eq!(planets[1].as_deref(), Some("Earth"));
    }

    #[test]
    fn test_home_planet_cascade_order() {
        let config = PipelineConfig::default();
        let table = DeckSpendTable::default();
        let resolver = CategoricalResolver::new(&config, &table);
        let mut df = DataFrame::new(vec![
            Column::new(
                "GroupId".into(),
                &["1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "1"],
            ),
            Column::new(
                "LastName".into(),
                &["Kay", "Lee", "Moe", "Ned", "Oz", "Pam", "Quo", "Kay", "Rae", "Sal", "Ute"],
            ),
            Column::new(
                "Deck".into(),
                &["F", "D", "D", "E", "E", "E", "E", "D", "D", "F", "E"],
            ),
            Column::new(
                "Side".into(),
                &["P", "S", "S", "S", "S", "S", "P", "S", "S", "S", "P"],
            ),
            Column::new(
                "HomePlanet".into(),
                &[
                    Some("Mars"),
                    Some("Europa"),
                    Some("Europa"),
                    Some("Earth"),
                    Some("Earth"),
                    Some("Earth"),
                    Some("Earth"),
                    None,
                    None,
                    None,
                    None,
                ],
            ),
        ])
        .unwrap();

        resolver.resolve_home_planet(&mut df).unwrap();
        let planets = text_values(&df, "HomePlanet").unwrap();
        // Family before cabin block
        assert_eq!(planets[7].as_deref(), Some("Mars"));
        // Cabin block before the dataset-wide mode
        assert_eq!(planets[8].as_deref(), Some("Europa"));
        // Nothing in common with anyone
        assert_eq!(planets[9].as_deref(), Some("Earth"));
        // Group before cabin block
        assert_eq!(planets[10].as_deref(), Some("Mars"));
    }

    #[test]
    fn test_destination_cascade_order() {
        let config = PipelineConfig::default().with_default_destination("Unknown");
        let table = DeckSpendTable::default();
        let resolver = CategoricalResolver::new(&config, &table);

        let x = Some("PSO J318.5-22");
        let y = Some("55 Cancri e");
        let z = Some("Kepler-22b");
        let w = Some("TRAPPIST-1e");
        let mut df = DataFrame::new(vec![
            Column::new(
                "Deck".into(),
                &[
                    "B", "B", "B", "B", "C", "E", "E", "E", "D", "D", "D", "D", "D", "D", "D",
                    "B", "B", "A", "A", "T", "T",
                ],
            ),
            Column::new(
                "CabinNumber".into(),
                &[
                    12.0, 30.0, 31.0, 32.0, 5.0, 1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0,
                    7.0, 12.0, 40.0, 7.0, 8.0, 1.0, 2.0,
                ],
            ),
            Column::new(
                "Side".into(),
                &[
                    "P", "P", "P", "P", "S", "P", "P", "P", "S", "S", "S", "S", "S", "S", "S",
                    "P", "P", "S", "P", "P", "S",
                ],
            ),
            Column::new(
                "GroupId".into(),
                &[
                    "1", "2", "3", "4", "9", "9", "9", "9", "20", "21", "22", "23", "24", "25",
                    "26", "50", "51", "9", "9", "60", "61",
                ],
            ),
            Column::new(
                "LastName".into(),
                &[
                    "Ash", "Birch", "Cedar", "Dune", "Zed", "Other", "Other", "Other", "Fox",
                    "Fox", "Fox", "Fox", "Fox", "Fox", "Fox", "Solo", "Lone", "Zed", "Nobody",
                    "Zed", "Vale",
                ],
            ),
            Column::new(
                "Destination".into(),
                &[
                    x, y, y, y, z, x, x, x, w, w, w, w, w, w, w, None, None, None, None, None,
                    None,
                ],
            ),
        ])
        .unwrap();

        resolver.resolve_destination(&mut df).unwrap();
        let destinations = text_values(&df, "Destination").unwrap();
        let resolved: Vec<Option<&str>> = destinations[15..].iter().map(|d| d.as_deref()).collect();
        // Cabin-mate, cabin block, group and family, group, family, dataset-wide mode
        assert_eq!(resolved, vec![x, y, z, x, z, w]);
    }

    #[test]
    fn test_side_cascade_order() {
        let config = PipelineConfig::default();
        let table = DeckSpendTable::default();
        let resolver = CategoricalResolver::new(&config, &table);
        let mut df = DataFrame::new(vec![
            Column::new(
                "GroupId".into(),
                &[
                    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "12", "1", "11", "13", "14",
                ],
            ),
            Column::new(
                "LastName".into(),
                &[
                    "Ash", "Ash", "Ash", "Bo", "Cy", "Dee", "Eli", "Finn", "Gil", "Hal", "Ash",
                    "Ash", "Ash", "Fay", "Gus",
                ],
            ),
            Column::new(
                "HomePlanet".into(),
                &[
                    "Earth", "Mars", "Mars", "Europa", "Europa", "Earth", "Earth", "Earth",
                    "Earth", "Earth", "Mars", "Mars", "Europa", "Europa", "Venus",
                ],
            ),
            Column::new(
                "Destination".into(),
                &[
                    "TRAPPIST-1e",
                    "55 Cancri e",
                    "55 Cancri e",
                    "PSO J318.5-22",
                    "PSO J318.5-22",
                    "TRAPPIST-1e",
                    "TRAPPIST-1e",
                    "TRAPPIST-1e",
                    "TRAPPIST-1e",
                    "TRAPPIST-1e",
                    "55 Cancri e",
                    "55 Cancri e",
                    "PSO J318.5-22",
                    "PSO J318.5-22",
                    "Nowhere",
                ],
            ),
            Column::new(
                "Side".into(),
                &[
                    Some("P"),
                    Some("S"),
                    Some("S"),
                    Some("P"),
                    Some("P"),
                    Some("S"),
                    Some("S"),
                    Some("S"),
                    Some("S"),
                    Some("S"),
                    Some("S"),
                    None,
                    None,
                    None,
                    None,
                ],
            ),
        ])
        .unwrap();

        resolver.resolve_side(&mut df).unwrap();
        let sides = text_values(&df, "Side").unwrap();
        let resolved: Vec<Option<&str>> = sides[11..].iter().map(|s| s.as_deref()).collect();
        // Group, family, route, dataset-wide mode
        assert_eq!(resolved, vec![Some("P"), Some("S"), Some("P"), Some("S")]);
    }

    #[test]
    fn test_destination_default_when_nothing_known() {
        let config = PipelineConfig::default();
        let table = DeckSpendTable::default();
        let resolver = CategoricalResolver::new(&config, &table);
        let mut df = DataFrame::new(vec![
            Column::new("GroupId".into(), &["1"]),
            Column::new("LastName".into(), &["Doe"]),
            Column::new("Deck".into(), &["B"]),
            Column::new("CabinNumber".into(), &[12.0]),
            Column::new("Side".into(), &["P"]),
            Column::new("Destination".into(), &[None::<&str>]),
        ])
        .unwrap();

        resolver.resolve_destination(&mut df).unwrap();
        let destinations = text_values(&df, "Destination").unwrap();
        assert_eq!(destinations[0].as_deref(), Some("TRAPPIST-1e"));
    }

    #[test]
    fn test_resolve_deck_leaves_unknown_side() {
        let config = PipelineConfig::default();
        let table = earth_table();
        let resolver = CategoricalResolver::new(&config, &table);
        let mut df = DataFrame::new(vec![
            Column::new("Deck".into(), &[None::<&str>, None]),
            Column::new("HomePlanet".into(), &["Earth", "Earth"]),
            Column::new("Side".into(), &[Some("S"), None]),
            Column::new(TOTAL_SPENDING.into(), &[60.0, 60.0]),
        ])
        .unwrap();

        resolver.resolve_deck(&mut df).unwrap();
        let decks = text_values(&df, "Deck").unwrap();
        assert_eq!(decks, vec![Some("F".to_string()), None]);
    }

    #[test]
    fn test_age_median_and_groups() {
        let config = PipelineConfig::default();
        let table = DeckSpendTable::default();
        let resolver = CategoricalResolver::new(&config, &table);
        let mut df = DataFrame::new(vec![
            Column::new("HomePlanet".into(), &["Earth", "Earth", "Earth", "Mars"]),
            Column::new("CryoSleep".into(), &[0.0, 0.0, 0.0, 1.0]),
            Column::new(SPENT_MONEY.into(), &[1i64, 1, 1, 0]),
            Column::new(TRAVELING_ALONE.into(), &[1i64, 1, 1, 0]),
            Column::new("Age".into(), &[Some(20.0), Some(30.0), None, None]),
        ])
        .unwrap();

        resolver.resolve_age(&mut df).unwrap();
        let ages = numeric_values(&df, "Age").unwrap();
        assert_eq!(ages[2], Some(25.0));
        // No group peers: dataset-wide median
        assert_eq!(ages[3], Some(25.0));

        let groups = text_values(&df, "AgeGroup").unwrap();
        assert_eq!(groups[0].as_deref(), Some("19 - 25"));
        assert_eq!(groups[1].as_deref(), Some("31 - 40"));
        assert_eq!(groups[2].as_deref(), Some("26 - 30"));
    }
}
