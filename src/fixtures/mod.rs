//! Fixtures
//!
//! A fixture set is three YAML files sharing a name under a base directory:
//!
//! - `plants/<set>.yml`: `plants: [{ name, capacity, allowed_models }]`
//! - `orders/<set>.yml`: `today: YYYY-MM-DD` and `orders: [{ id, due_date, lines }]`
//! - `weights/<set>.yml`: `weights: { w_quantity, w_due, ... }` and optional `objectives`

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use jiff::civil::Date;
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;

use crate::{
    objectives::ObjectiveSpec,
    orders::Order,
    plants::Plant,
    problem::{AllocationProblem, ProblemError},
    weights::WeightsConfig,
};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// No fixture file exists for the set
    #[error("Unknown fixture set `{set}`: {} not found", path.display())]
    UnknownSet {
        /// Fixture set name
        set: String,

        /// Missing file
        path: PathBuf,
    },

    /// The loaded data does not form a valid problem
    #[error(transparent)]
    Problem(#[from] ProblemError),
}

#[derive(Debug, Deserialize)]
struct PlantsFixture {
    plants: Vec<Plant>,
}

#[derive(Debug, Deserialize)]
struct OrdersFixture {
    today: Date,

    #[serde(default)]
    orders: Vec<Order>,
}

#[derive(Debug, Deserialize)]
struct WeightsFixture {
    weights: WeightsConfig,

    #[serde(default)]
    objectives: Vec<ObjectiveSpec>,
}

/// Loaded fixture set
#[derive(Debug, Clone)]
pub struct Fixture {
    base_path: PathBuf,
    plants: Vec<Plant>,
    orders: Vec<Order>,
    today: Option<Date>,
    weights: WeightsConfig,
    objectives: Vec<ObjectiveSpec>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Create a new empty fixture rooted at `./fixtures`
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            plants: Vec::new(),
            orders: Vec::new(),
            today: None,
            weights: WeightsConfig::default(),
            objectives: Vec::new(),
        }
    }

    /// Load plants from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, cannot be read or cannot be parsed.
    pub fn load_plants(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: PlantsFixture = self.read("plants", name)?;

        self.plants = fixture.plants;

        Ok(self)
    }

    /// Load orders and the planning date from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, cannot be read or cannot be parsed.
    pub fn load_orders(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: OrdersFixture = self.read("orders", name)?;

        self.today = Some(fixture.today);
        self.orders = fixture.orders;

        Ok(self)
    }

    /// Load weights and caller-supplied objectives from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, cannot be read or cannot be parsed.
    pub fn load_weights(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: WeightsFixture = self.read("weights", name)?;

        self.weights = fixture.weights;
        self.objectives = fixture.objectives;

        Ok(self)
    }

    /// Load a complete fixture set (plants, orders and weights with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::new().with_set(name)
    }

    /// Load a complete fixture set from this fixture's base path
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn with_set(mut self, name: &str) -> Result<Self, FixtureError> {
        self.load_plants(name)?
            .load_orders(name)?
            .load_weights(name)?;

        Ok(self)
    }

    /// Base directory fixture files are read from
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Loaded plants
    pub fn plants(&self) -> &[Plant] {
        &self.plants
    }

    /// Loaded orders
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Planning date of the loaded orders
    pub fn today(&self) -> Option<Date> {
        self.today
    }

    /// Loaded weights
    pub fn weights(&self) -> &WeightsConfig {
        &self.weights
    }

    /// Loaded caller-supplied objectives
    pub fn objectives(&self) -> &[ObjectiveSpec] {
        &self.objectives
    }

    /// Build a validated [`AllocationProblem`] from the loaded data.
    ///
    /// Orders loaded without a planning date are planned as of `fallback_today`.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Problem`] if the data is not a valid problem.
    pub fn problem(&self, fallback_today: Date) -> Result<AllocationProblem, FixtureError> {
        let today = self.today.unwrap_or(fallback_today);

        let mut problem = AllocationProblem::from_orders(
            &self.orders,
            self.plants.clone(),
            self.weights.clone(),
            today,
        )?;

        for spec in &self.objectives {
            problem = problem.with_objective(spec.clone())?;
        }

        Ok(problem)
    }

    fn read<T: DeserializeOwned>(&self, kind: &str, name: &str) -> Result<T, FixtureError> {
        let file_path = self.base_path.join(kind).join(format!("{name}.yml"));

        let contents = match fs::read_to_string(&file_path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(FixtureError::UnknownSet {
                    set: name.to_string(),
                    path: file_path,
                });
            }
            Err(err) => return Err(err.into()),
        };

        Ok(serde_norway::from_str(&contents)?)
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn loads_sample_set() -> TestResult {
        let fixture = Fixture::from_set("sample")?;

        assert!(!fixture.plants().is_empty());
        assert!(!fixture.orders().is_empty());
        assert!(fixture.today().is_some());

        let problem = fixture.problem(date(2025, 1, 1))?;

        assert_eq!(problem.plants().len(), fixture.plants().len());
        assert_eq!(problem.orders_count(), fixture.orders().len());

        Ok(())
    }

    #[test]
    fn missing_set_is_unknown() {
        let result = Fixture::from_set("does-not-exist");

        assert!(matches!(
            result,
            Err(FixtureError::UnknownSet { ref set, .. }) if set == "does-not-exist"
        ));
    }

    #[test]
    fn empty_fixture_has_no_plants() {
        let fixture = Fixture::default();

        assert!(fixture.plants().is_empty());
        assert!(matches!(
            fixture.problem(date(2025, 1, 1)),
            Err(FixtureError::Problem(ProblemError::NoPlants))
        ));
    }
}
