/// Optional resource limits for one parse.
///
/// Both limits are off by default: a parse runs until the input is consumed.
/// Set them when the grammar or the input is untrusted, e.g. to stop a
/// grammar that loops on zero-width tokens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FuelLimits {
    /// Maximum scan steps.
    pub(crate) exec_fuel: Option<u32>,
    /// Maximum stack depth, root included.
    pub(crate) recursion_limit: Option<u32>,
}

impl FuelLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exec_fuel(mut self, fuel: u32) -> Self {
        self.exec_fuel = Some(fuel);
        self
    }

    pub fn recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = Some(limit);
        self
    }

    pub fn get_exec_fuel(&self) -> Option<u32> {
        self.exec_fuel
    }

    pub fn get_recursion_limit(&self) -> Option<u32> {
        self.recursion_limit
    }
}
