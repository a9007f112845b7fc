use crate::conf::types::{Branch, Condition, ConditionSource, Match};
use crate::document::{InternalRedirectLocation, Map, Parameter};
use crate::synth::ctx::Pass;
use crate::synth::naming::{match_location, matches_default};
use crate::synth::routing::RouteScope;

/// Literal map values the data plane reserves as keywords.
const RESERVED_MAP_VALUES: [&str; 4] = ["default", "hostnames", "include", "volatile"];

impl Pass<'_> {
    /// Each condition chains to the next; the main map picks the first match
    /// whose whole chain produced `1`.
    pub(crate) fn compile_matches_route(
        &mut self,
        scope: &RouteScope<'_>,
        matches: &[Match],
        otherwise: Branch<'_>,
    ) {
        let index = self.indices.next_matches();

        for (i, m) in matches.iter().enumerate() {
            for (j, condition) in m.conditions.iter().enumerate() {
                let success = if j + 1 < m.conditions.len() {
                    self.namer.match_condition(index, i, j + 1)
                } else {
                    "1".to_string()
                };
                self.out.maps.push(Map {
                    source: condition_source(condition),
                    variable: self.namer.match_condition(index, i, j),
                    parameters: condition_parameters(&condition.value, &success),
                });
            }
        }

        // Split indices are handed out before the main map so it can name them.
        let branches: Vec<(Option<Branch<'_>>, Option<usize>)> = matches
            .iter()
            .map(|m| {
                let branch = m.branch();
                let split_index = match branch {
                    Some(Branch::Splits(splits)) => Some(self.reserve_splits(splits)),
                    _ => None,
                };
                (branch, split_index)
            })
            .collect();
        let default_split_index = match otherwise {
            Branch::Splits(splits) => Some(self.reserve_splits(splits)),
            Branch::Action(_) => None,
        };

        let mut source = String::new();
        let mut parameters = Vec::with_capacity(matches.len() + 1);
        for (i, (branch, split_index)) in branches.iter().enumerate() {
            source.push_str(&self.namer.match_condition(index, i, 0));
            let result = match (branch, split_index) {
                (Some(Branch::Splits(splits)), Some(sc)) => self.splits_destination(*sc, splits),
                _ => match_location(index, i),
            };
            parameters.push(Parameter::new(format!("~^{}1", "0".repeat(i)), result));
        }
        let default_result = match (otherwise, default_split_index) {
            (Branch::Splits(splits), Some(sc)) => self.splits_destination(sc, splits),
            _ => matches_default(index),
        };
        parameters.push(Parameter::new("default", default_result));

        let main = self.namer.matches_main(index);
        self.out.maps.push(Map {
            source,
            variable: main.clone(),
            parameters,
        });

        for (i, (branch, split_index)) in branches.into_iter().enumerate() {
            match (branch, split_index) {
                (Some(Branch::Splits(splits)), Some(sc)) => self.compile_splits(scope, splits, sc),
                (Some(Branch::Action(action)), _) => {
                    self.action_location(scope, &match_location(index, i), true, action);
                }
                _ => self.report.route_without_action(&scope.owner, scope.path),
            }
        }
        match (otherwise, default_split_index) {
            (Branch::Splits(splits), Some(sc)) => self.compile_splits(scope, splits, sc),
            (Branch::Action(action), _) => {
                self.action_location(scope, &matches_default(index), true, action);
            }
            (Branch::Splits(_), None) => {}
        }

        self.out.internal_redirects.push(InternalRedirectLocation {
            path: scope.path.to_string(),
            destination: main,
        });
    }
}

pub(crate) fn condition_source(condition: &Condition) -> String {
    match &condition.source {
        ConditionSource::Header(name) => {
            format!("$http_{}", name.replace('-', "_").to_lowercase())
        }
        ConditionSource::Cookie(name) => format!("$cookie_{name}"),
        ConditionSource::Argument(name) => format!("$arg_{name}"),
        ConditionSource::Variable(variable) => variable.clone(),
    }
}

/// `value -> success, default -> 0`, with the results swapped for `!value`.
pub(crate) fn condition_parameters(value: &str, success: &str) -> Vec<Parameter> {
    let (value, negated) = match value.strip_prefix('!') {
        Some(rest) => (rest, true),
        None => (value, false),
    };

    let value = if value.is_empty() {
        "\"\"".to_string()
    } else if RESERVED_MAP_VALUES.contains(&value) {
        format!("\\{value}")
    } else {
        format!("\"{value}\"")
    };

    let (matched, unmatched) = if negated {
        ("0", success)
    } else {
        (success, "0")
    };
    vec![
        Parameter::new(value, matched),
        Parameter::new("default", unmatched),
    ]
}
