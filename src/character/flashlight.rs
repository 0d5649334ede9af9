/// Receiver of flashlight toggle requests.
pub trait LightToggle {
    fn toggle(&mut self);
}

/// On/off flashlight state. Starts off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flashlight {
    enabled: bool,
    toggles: u32,
}

impl Flashlight {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of toggles received since creation.
    pub fn toggle_count(&self) -> u32 {
        self.toggles
    }
}

impl LightToggle for Flashlight {
    fn toggle(&mut self) {
        self.enabled = !self.enabled;
        self.toggles += 1;
        log::debug!("flashlight {}", if self.enabled { "on" } else { "off" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_flips_state() {
        let mut light = Flashlight::default();
        assert!(!light.is_enabled());
        light.toggle();
        assert!(light.is_enabled());
        light.toggle();
        assert!(!light.is_enabled());
        assert_eq!(light.toggle_count(), 2);
    }
}
