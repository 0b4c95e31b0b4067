/// Log levels are single bits so an activation mask can switch each on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Info,
    Detailed,
    Debug,
}

impl LogLevel {
    pub const ALL: [LogLevel; 3] = [Self::Info, Self::Detailed, Self::Debug];
    pub const ALL_BITS: u8 = 0b111;

    pub fn bit(self) -> u8 {
        match self {
            Self::Info => 0b001,
            Self::Detailed => 0b010,
            Self::Debug => 0b100,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Detailed => "detailed",
            Self::Debug => "debug",
        }
    }

    pub fn parse_cli(value: &str) -> Option<Self> {
        match value {
            "info" => Some(Self::Info),
            "detailed" => Some(Self::Detailed),
            "debug" => Some(Self::Debug),
            _ => None,
        }
    }

    /// Mask enabling this level and every less verbose one.
    pub fn mask_through(self) -> u8 {
        self.bit() | (self.bit() - 1)
    }

    pub fn is_active(self, activation_level: u8) -> bool {
        activation_level & self.bit() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::LogLevel;

    #[test]
    fn activation_mask_reads_bits_right_to_left() {
        // 0b111: every level.
        assert!(LogLevel::Info.is_active(7));
        assert!(LogLevel::Detailed.is_active(7));
        assert!(LogLevel::Debug.is_active(7));

        // 0b1010: only the second (and an unused fourth) bit.
        assert!(!LogLevel::Info.is_active(10));
        assert!(LogLevel::Detailed.is_active(10));
        assert!(!LogLevel::Debug.is_active(10));

        for level in [LogLevel::Info, LogLevel::Detailed, LogLevel::Debug] {
            assert!(!level.is_active(0));
        }
    }

    #[test]
    fn level_strings_round_trip() {
        for level in LogLevel::ALL {
            assert_eq!(LogLevel::parse_cli(level.as_str()), Some(level));
        }
        assert_eq!(LogLevel::parse_cli("trace"), None);
    }

    #[test]
    fn level_mask_includes_less_verbose_levels() {
        assert_eq!(LogLevel::Info.mask_through(), 0b001);
        assert_eq!(LogLevel::Detailed.mask_through(), 0b011);
        assert_eq!(LogLevel::Debug.mask_through(), LogLevel::ALL_BITS);
    }
}
