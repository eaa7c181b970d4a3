//! Simulated float switch monitoring the remaining quantity of a container

/// Maintenance is flagged once the container drops to this fill percentage.
const MAINTENANCE_THRESHOLD_PERCENT: f64 = 10.0;

/// Tracks the fill level of one ingredient container as a percentage of a
/// nominal full container, and derives the maintenance flag from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatSwitch {
    nominal_quantity: f64,
    left_quantity: f64,
    maintenance: bool,
}

impl FloatSwitch {
    /// Creates a float switch reading a full container
    /// # Arguments
    /// * `nominal_quantity` - Capacity of a full container, in centilitres
    pub fn new(nominal_quantity: f64) -> FloatSwitch {
        FloatSwitch {
            nominal_quantity,
            left_quantity: 100.0,
            maintenance: false,
        }
    }

    /// Remaining fill as a percentage, in [0, 100]
    pub fn left_quantity(&self) -> f64 {
        self.left_quantity
    }

    pub fn maintenance_required(&self) -> bool {
        self.maintenance
    }

    /// Fill percentage a dispense of `volume_ml` consumes
    pub fn fill_percent_for(&self, volume_ml: f64) -> f64 {
        ((volume_ml / 10.0) / self.nominal_quantity) * 100.0
    }

    /// Subtracts the fill consumed by dispensing `volume_ml`, clamped at 0,
    /// and updates the maintenance flag. Returns the remaining fill.
    pub fn drain(&mut self, volume_ml: f64) -> f64 {
        let consumed = self.fill_percent_for(volume_ml);
        self.left_quantity = (self.left_quantity - consumed).max(0.0);
        self.maintenance = self.left_quantity <= MAINTENANCE_THRESHOLD_PERCENT;
        self.left_quantity
    }

    /// The container is out while a refill is in progress
    pub fn set_empty(&mut self) {
        self.left_quantity = 0.0;
    }

    /// A finished refill restores a full container
    pub fn set_full(&mut self) {
        self.left_quantity = 100.0;
        self.maintenance = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_container_is_full() {
        let switch = FloatSwitch::new(100.0);
        assert_eq!(switch.left_quantity(), 100.0);
        assert!(!switch.maintenance_required())
    }

    #[test]
    fn test_drain_is_proportional_to_volume() {
        let mut switch = FloatSwitch::new(100.0);
        // 50 ml over a 100-unit nominal container costs 5 %
        assert_eq!(switch.drain(50.0), 95.0);
        assert_eq!(switch.fill_percent_for(80.0), 8.0)
    }

    #[test]
    fn test_drain_clamps_at_zero() {
        let mut switch = FloatSwitch::new(100.0);
        switch.drain(950.0);
        assert_eq!(switch.left_quantity(), 5.0);
        assert_eq!(switch.drain(950.0), 0.0)
    }

    #[test]
    fn test_maintenance_flag_at_threshold() {
        let mut switch = FloatSwitch::new(100.0);
        switch.drain(890.0);
        assert!(!switch.maintenance_required());
        switch.drain(10.0);
        assert_eq!(switch.left_quantity(), 10.0);
        assert!(switch.maintenance_required())
    }

    #[test]
    fn test_refill_cycle_restores_full_container() {
        let mut switch = FloatSwitch::new(100.0);
        switch.drain(950.0);
        switch.set_empty();
        assert_eq!(switch.left_quantity(), 0.0);
        switch.set_full();
        assert_eq!(switch.left_quantity(), 100.0);
        assert!(!switch.maintenance_required())
    }
}
