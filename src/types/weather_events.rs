//! Decoding of the GSOD `FRSHTT` indicator field.

use bitflags::bitflags;

bitflags! {
    /// Weather events reported for a day.
    ///
    /// GSOD stores these as six decimal digits, one per event, in the order
    /// Fog, Rain (or drizzle), Snow (or ice pellets), Hail, Thunder, Tornado (or funnel cloud).
    /// Read as an integer the leading zeros are lost, so `10000` means rain only.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WeatherEvents: u8 {
        const FOG     = 1 << 0;
        const RAIN    = 1 << 1;
        const SNOW    = 1 << 2;
        const HAIL    = 1 << 3;
        const THUNDER = 1 << 4;
        const TORNADO = 1 << 5;
    }
}

const DIGIT_ORDER: [WeatherEvents; 6] = [
    WeatherEvents::FOG,
    WeatherEvents::RAIN,
    WeatherEvents::SNOW,
    WeatherEvents::HAIL,
    WeatherEvents::THUNDER,
    WeatherEvents::TORNADO,
];

impl WeatherEvents {
    /// Decodes the numeric FRSHTT value. Returns `None` if the value is negative, has more
    /// than six digits, or contains a digit other than 0 or 1.
    ///
    /// ```
    /// use weather_match::WeatherEvents;
    ///
    /// assert_eq!(WeatherEvents::from_frshtt(10000), Some(WeatherEvents::RAIN));
    /// assert_eq!(
    ///     WeatherEvents::from_frshtt(110010),
    ///     Some(WeatherEvents::FOG | WeatherEvents::RAIN | WeatherEvents::THUNDER)
    /// );
    /// assert_eq!(WeatherEvents::from_frshtt(20000), None);
    /// ```
    pub fn from_frshtt(value: i64) -> Option<Self> {
        if !(0..=111_111).contains(&value) {
            return None;
        }
        let mut events = WeatherEvents::empty();
        let mut rest = value;
        // least significant digit is the last event (tornado)
        for flag in DIGIT_ORDER.iter().rev() {
            match rest % 10 {
                0 => {}
                1 => events |= *flag,
                _ => return None,
            }
            rest /= 10;
        }
        Some(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_events() {
        assert_eq!(WeatherEvents::from_frshtt(100000), Some(WeatherEvents::FOG));
        assert_eq!(WeatherEvents::from_frshtt(1000), Some(WeatherEvents::HAIL));
        assert_eq!(WeatherEvents::from_frshtt(1), Some(WeatherEvents::TORNADO));
    }

    #[test]
    fn test_no_events() {
        assert_eq!(WeatherEvents::from_frshtt(0), Some(WeatherEvents::empty()));
    }

    #[test]
    fn test_all_events() {
        assert_eq!(WeatherEvents::from_frshtt(111111), Some(WeatherEvents::all()));
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert_eq!(WeatherEvents::from_frshtt(-1), None);
        assert_eq!(WeatherEvents::from_frshtt(1_000_000), None);
        assert_eq!(WeatherEvents::from_frshtt(12), None);
    }
}
