use crate::conf::types::Split;
use crate::document::{
    Distribution, KeyVal, KeyValZone, Map, Parameter, SplitClient, TwoWaySplitClients,
};
use crate::synth::ctx::{Pass, split_clients_needed};
use crate::synth::naming::split_location;
use crate::synth::routing::RouteScope;

const REQUEST_ID: &str = "$request_id";
const KEYVAL_ZONE_SIZE: &str = "100k";
const KEYVAL_STATE_DIR: &str = "/etc/nginx/state_files";

impl Pass<'_> {
    fn is_dynamic(&self, splits: &[Split]) -> bool {
        self.features.dynamic_weight_reload && splits.len() == 2
    }

    /// Reserves the split-client indices a set of splits will use.
    pub(crate) fn reserve_splits(&mut self, splits: &[Split]) -> usize {
        let count = split_clients_needed(splits.len(), self.features.dynamic_weight_reload);
        self.indices.reserve_split_clients(count)
    }

    /// Variable that evaluates to the chosen split location.
    pub(crate) fn splits_destination(&self, index: usize, splits: &[Split]) -> String {
        if self.is_dynamic(splits) {
            self.namer.weights_map(index)
        } else {
            self.namer.split_clients(index)
        }
    }

    /// Emits the split clients and one internal location per reachable split.
    ///
    /// Zero-weight splits are unreachable with static weights and get neither
    /// a distribution nor a location. With runtime-switchable weights every
    /// split stays addressable.
    pub(crate) fn compile_splits(
        &mut self,
        scope: &RouteScope<'_>,
        splits: &[Split],
        index: usize,
    ) {
        let dynamic = self.is_dynamic(splits);
        if dynamic {
            self.dynamic_split_clients(index, splits);
        } else {
            let distributions = splits
                .iter()
                .enumerate()
                .filter(|(_, split)| split.weight > 0)
                .map(|(i, split)| Distribution {
                    weight: format!("{}%", split.weight),
                    value: split_location(index, i),
                })
                .collect();
            self.out.split_clients.push(SplitClient {
                source: REQUEST_ID.to_string(),
                variable: self.namer.split_clients(index),
                distributions,
            });
        }

        for (i, split) in splits.iter().enumerate() {
            if !dynamic && split.weight == 0 {
                continue;
            }
            self.action_location(scope, &split_location(index, i), true, &split.action);
        }
    }

    /// One split client per 0..=100 weight pair, selected through a key-value
    /// entry that operators change at runtime.
    fn dynamic_split_clients(&mut self, index: usize, splits: &[Split]) {
        let namer = &self.namer;
        let mut parameters = Vec::new();

        for i in 0..=100u32 {
            let j = 100 - i;
            let mut distributions = Vec::new();
            if i > 0 {
                distributions.push(Distribution {
                    weight: format!("{i}%"),
                    value: split_location(index, 0),
                });
            }
            if j > 0 {
                distributions.push(Distribution {
                    weight: format!("{j}%"),
                    value: split_location(index, 1),
                });
            }

            let variable = namer.weights_split_clients(index, i, j);
            parameters.push(Parameter::new(namer.weights_key(index, i, j), &variable));
            self.out.split_clients.push(SplitClient {
                source: REQUEST_ID.to_string(),
                variable,
                distributions,
            });
        }

        // Ties go to the second split.
        let (i, j) = if splits[0].weight <= splits[1].weight {
            (0, 100)
        } else {
            (100, 0)
        };
        parameters.push(Parameter::new(
            "default",
            namer.weights_split_clients(index, i, j),
        ));

        let zone_name = namer.keyval_zone(index);
        self.out.maps.push(Map {
            source: namer.keyval_variable(index),
            variable: namer.weights_map(index),
            parameters,
        });
        self.out.key_val_zones.push(KeyValZone {
            name: zone_name.clone(),
            size: KEYVAL_ZONE_SIZE.to_string(),
            state: format!("{KEYVAL_STATE_DIR}/{zone_name}.json"),
        });
        self.out.key_vals.push(KeyVal {
            key: namer.keyval_key(index),
            variable: namer.keyval_variable(index),
            zone_name: zone_name.clone(),
        });
        self.out.two_way_split_clients.push(TwoWaySplitClients {
            key: namer.keyval_key(index),
            variable: namer.keyval_variable(index),
            zone_name,
            weights: [splits[0].weight, splits[1].weight],
            split_clients_index: index,
        });
    }
}
