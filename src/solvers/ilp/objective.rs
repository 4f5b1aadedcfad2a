//! Objective Assembly
//!
//! Every weighted term is mapped to an integer coefficient on a common scale `K`:
//!
//! - additive objectives: `round(K × weight / upper_bound)`, at least 1, negated when minimised
//! - structural penalties: `max(1, round(K × weight / normalizer))`, where the normalizer is a
//!   closed-form bound on the penalised count
//!
//! The maximised objective is the additive sum minus the group-split, plants-used and
//! soft-shortfall penalties.

use good_lp::Variable;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    classify::ClassifiedItems,
    items::groups::ModelGroup,
    normalize::ObjectiveBound,
    objectives::{ObjectiveSpec, Sense},
    problem::AllocationProblem,
    solvers::{
        SolverError,
        ilp::{ModelVars, i64_to_f64_exact, observer::ILPObserver, state::ILPState},
    },
};

/// Integer coefficient of one additive objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditiveCoefficient {
    /// Objective name
    pub name: String,

    /// Optimisation direction
    pub sense: Sense,

    /// Weight
    pub weight: f64,

    /// Knapsack upper bound used for normalisation
    pub upper_bound: f64,

    /// False when the objective does not take part
    pub used: bool,

    /// Signed coefficient applied to every placed unit of value
    pub coefficient: i64,
}

/// Integer coefficient of one structural penalty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructuralCoefficient {
    /// Weight
    pub weight: f64,

    /// Upper bound on the penalised count
    pub normalizer: u64,

    /// Penalty per unit (zero when disabled)
    pub coefficient: i64,
}

/// Every coefficient of the objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveCoefficients {
    /// Global scale `K`
    pub scale: i64,

    /// Additive objectives, in input order
    pub additive: Vec<AdditiveCoefficient>,

    /// Penalty per extra plant a model group is spread over
    pub group: StructuralCoefficient,

    /// Penalty per plant used
    pub plants: StructuralCoefficient,

    /// Penalty per unit of soft-minimum shortfall
    pub soft_min: StructuralCoefficient,

    /// Combined additive coefficient of each item's placement, by item index (zero when not
    /// eligible)
    pub item_coefficients: Vec<i64>,
}

impl ObjectiveCoefficients {
    /// Compute all coefficients for a classified problem.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] if a coefficient overflows `i64`.
    pub fn compute(
        problem: &AllocationProblem,
        specs: &[ObjectiveSpec],
        bounds: &[ObjectiveBound],
        classified: &ClassifiedItems,
        groups: &[ModelGroup],
    ) -> Result<Self, SolverError> {
        let scaling = problem.scaling();
        let weights = problem.weights();
        let k = scaling.objective_scale;

        let additive = bounds
            .iter()
            .map(|bound| {
                let coefficient = if bound.used {
                    additive_coefficient(k, bound.weight, bound.upper_bound)
                        .ok_or_else(|| SolverError::CoefficientOverflow {
                            objective: bound.name.clone(),
                        })?
                        .checked_mul(bound.sense.sign())
                        .ok_or_else(|| SolverError::CoefficientOverflow {
                            objective: bound.name.clone(),
                        })?
                } else {
                    0
                };

                Ok(AdditiveCoefficient {
                    name: bound.name.clone(),
                    sense: bound.sense,
                    weight: bound.weight,
                    upper_bound: bound.upper_bound,
                    used: bound.used,
                    coefficient,
                })
            })
            .collect::<Result<Vec<_>, SolverError>>()?;

        let mut item_coefficients = vec![0_i64; problem.items().len()];

        for &item_idx in classified.eligible() {
            let mut total: i64 = 0;

            for (spec, term) in specs.iter().zip(&additive) {
                let value = spec.values.get(item_idx).copied().unwrap_or(0);

                total = term
                    .coefficient
                    .checked_mul(value)
                    .and_then(|contribution| total.checked_add(contribution))
                    .ok_or_else(|| SolverError::CoefficientOverflow {
                        objective: spec.name.clone(),
                    })?;
            }

            if let Some(slot) = item_coefficients.get_mut(item_idx) {
                *slot = total;
            }
        }

        let extra_plants_max = groups
            .iter()
            .map(|group| to_u64(group.max_extra_plants()))
            .fold(0_u64, u64::saturating_add)
            .max(1);

        let plants_used_max = to_u64(problem.plants().len().min(classified.eligible().len()));

        let allowed_pairs = groups
            .iter()
            .map(|group| to_u64(group.plants().len()))
            .fold(0_u64, u64::saturating_add);

        let soft_normalizer = weights.soft_min_qty.saturating_mul(allowed_pairs).max(1);

        let group = structural(k, weights.w_group, extra_plants_max, true)?;
        let plants = structural(k, weights.w_plants, plants_used_max, true)?;
        let soft_min = structural(
            k,
            weights.w_soft_min,
            soft_normalizer,
            weights.soft_min_enabled(),
        )?;

        debug!(
            scale = k,
            group = group.coefficient,
            plants = plants.coefficient,
            soft_min = soft_min.coefficient,
            extra_plants_max,
            plants_used_max,
            soft_normalizer,
            "objective coefficients"
        );

        Ok(Self {
            scale: k,
            additive,
            group,
            plants,
            soft_min,
            item_coefficients,
        })
    }

    /// Add every objective term over the model variables to `state`.
    ///
    /// # Errors
    ///
    /// Returns a [`SolverError`] if a coefficient cannot be represented exactly as `f64`.
    pub(crate) fn apply<O: ILPObserver + ?Sized>(
        &self,
        state: &mut ILPState,
        vars: &ModelVars,
        observer: &mut O,
    ) -> Result<(), SolverError> {
        let mut add = |state: &mut ILPState,
                       var: Variable,
                       coefficient: i64|
         -> Result<(), SolverError> {
            if coefficient == 0 {
                return Ok(());
            }

            let coeff = exact(coefficient)?;

            state.add_to_objective(var, coeff);
            observer.on_objective_term(var, coeff);

            Ok(())
        };

        for item in &vars.items {
            let coefficient = self.item_coefficients.get(item.item_idx).copied().unwrap_or(0);

            add(state, item.placed, coefficient)?;
        }

        let group_penalty = negate(self.group.coefficient)?;
        let plants_penalty = negate(self.plants.coefficient)?;
        let soft_penalty = negate(self.soft_min.coefficient)?;

        // Σ present − Σ used counts the extra plants each group is spread over.
        for group in &vars.groups {
            for &(_, present) in &group.present {
                add(state, present, group_penalty)?;
            }

            add(state, group.used, self.group.coefficient)?;

            for &(_, shortfall) in &group.shortfall {
                add(state, shortfall, soft_penalty)?;
            }
        }

        for &(_, plant_used) in &vars.plants {
            add(state, plant_used, plants_penalty)?;
        }

        Ok(())
    }
}

/// `max(1, round(K × weight / upper_bound))`, or `None` when it does not fit `i64`.
fn additive_coefficient(k: i64, weight: f64, upper_bound: f64) -> Option<i64> {
    let k = k.to_f64()?;
    let raw = (k * weight / upper_bound).round().to_i64()?;

    Some(raw.max(1))
}

fn structural(
    k: i64,
    weight: f64,
    normalizer: u64,
    enabled: bool,
) -> Result<StructuralCoefficient, SolverError> {
    let coefficient = if enabled && weight > 0.0 {
        let k_f = k.to_f64().unwrap_or(0.0);
        let denom = normalizer.max(1).to_f64().unwrap_or(f64::MAX);

        (k_f * weight / denom)
            .round()
            .to_i64()
            .ok_or_else(|| SolverError::CoefficientOverflow {
                objective: "structural".to_string(),
            })?
            .max(1)
    } else {
        0
    };

    Ok(StructuralCoefficient {
        weight,
        normalizer,
        coefficient,
    })
}

fn negate(coefficient: i64) -> Result<i64, SolverError> {
    coefficient
        .checked_neg()
        .ok_or(SolverError::CoefficientNotRepresentable {
            value: i128::from(coefficient),
        })
}

fn exact(coefficient: i64) -> Result<f64, SolverError> {
    i64_to_f64_exact(coefficient).ok_or(SolverError::CoefficientNotRepresentable {
        value: i128::from(coefficient),
    })
}

fn to_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}
