use crate::conf::types::AccessControl;
use crate::synth::policy::{Checked, PolicyConfig, PolicyWarning};

impl PolicyConfig {
    /// Allow rules dominate deny rules; both lists are kept and rendered as-is.
    pub(crate) fn add_access_control(&mut self, policy: &AccessControl) -> Checked {
        self.allow.extend(policy.allow.iter().cloned());
        self.deny.extend(policy.deny.iter().cloned());

        if !self.allow.is_empty() && !self.deny.is_empty() {
            return Ok(vec![PolicyWarning::AccessControlOverridden]);
        }
        Ok(Vec::new())
    }
}
