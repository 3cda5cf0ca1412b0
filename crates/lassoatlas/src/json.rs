//! JSON serialization types for solver results

use crate::model::{Literal, Model};
use crate::solver::Verdict;
use serde::{Deserialize, Serialize};

/// JSON representation of a model literal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiteralJson {
    pub name: String,
    pub positive: bool,
}

impl From<&Literal> for LiteralJson {
    fn from(literal: &Literal) -> Self {
        LiteralJson {
            name: literal.name.clone(),
            positive: literal.positive,
        }
    }
}

/// JSON representation of a lasso model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelJson {
    pub states: Vec<Vec<LiteralJson>>,
    pub loop_state: u64,
}

impl From<&Model> for ModelJson {
    fn from(model: &Model) -> Self {
        ModelJson {
            states: model
                .states
                .iter()
                .map(|state| state.iter().map(|l| l.into()).collect())
                .collect(),
            loop_state: model.loop_state,
        }
    }
}

/// JSON representation of a verdict with its witness
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResultJson {
    Satisfiable {
        #[serde(skip_serializing_if = "Option::is_none")]
        model: Option<ModelJson>,
        time_seconds: f64,
    },
    Unsatisfiable {
        time_seconds: f64,
    },
    Undefined {
        time_seconds: f64,
    },
}

impl ResultJson {
    pub fn new(verdict: Verdict, model: Option<&Model>, time_seconds: f64) -> Self {
        match verdict {
            Verdict::Satisfiable => ResultJson::Satisfiable {
                model: model.map(|m| m.into()),
                time_seconds,
            },
            Verdict::Unsatisfiable => ResultJson::Unsatisfiable { time_seconds },
            Verdict::Undefined => ResultJson::Undefined { time_seconds },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::State;

    #[test]
    fn satisfiable_result_serializes_with_model() {
        let mut state = State::new();
        state.insert(Literal::positive("p"));
        state.insert(Literal::negative("q"));
        let model = Model {
            states: vec![state],
            loop_state: 0,
        };
        let json = serde_json::to_value(ResultJson::new(
            Verdict::Satisfiable,
            Some(&model),
            0.25,
        ))
        .unwrap();
        assert_eq!(json["status"], "satisfiable");
        assert_eq!(json["model"]["loop_state"], 0);
        assert_eq!(json["model"]["states"][0][0]["name"], "p");
        assert_eq!(json["model"]["states"][0][1]["positive"], false);
    }

    #[test]
    fn unsatisfiable_result_has_no_model_field() {
        let json =
            serde_json::to_value(ResultJson::new(Verdict::Unsatisfiable, None, 0.1)).unwrap();
        assert_eq!(json["status"], "unsatisfiable");
        assert!(json.get("model").is_none());
    }
}
