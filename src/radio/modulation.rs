//! # Gateway Modulation Vocabulary
//!
//! Closed enumerations for the modulation, bandwidth, datarate, coderate, CRC
//! status and TX trigger fields exchanged with the concentrator. Every type
//! keeps the numeric code the hardware uses, and `Default` always encodes as
//! `0` ("let the hardware pick").
//!
//! ```text
//! modulation   Default=0x00  LoRa=0x10  FSK=0x20  GFSK=0x21
//! bandwidth    Default=0x00  500k=0x04  250k=0x08  125k=0x0C
//! datarate     Default=0x00  SF7=0x02 .. SF12=0x40  multi-SF=0x7E
//! coderate     Default=0x00  4/5=0x11 .. 4/8=0x14
//! crc status   ok=1  error=0  absent=-1
//! tx mode      immediate=0  timestamped=1  on_gps=2  on_event=3
//!              gps_delayed=4  event_delayed=5
//! ```

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A raw code that does not name any known value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown {kind} code {code:#04x}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: i32,
}

/// Declares a field-less enum with a fixed hardware code per variant,
/// along with `code()` and `TryFrom<repr>`.
macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $repr:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident = $code:expr,)+
        }
    ) => {
        $(#[$meta])*
        #[repr($repr)]
        $vis enum $name {
            $($(#[$vmeta])* $variant = $code,)+
        }

        impl $name {
            /// Raw hardware code of this value
            pub fn code(self) -> $repr {
                self as $repr
            }
        }

        impl TryFrom<$repr> for $name {
            type Error = UnknownCode;

            fn try_from(code: $repr) -> Result<Self, UnknownCode> {
                $(
                    if code == $code {
                        return Ok($name::$variant);
                    }
                )+
                Err(UnknownCode { kind: $kind, code: code as i32 })
            }
        }
    };
}

coded_enum! {
    /// Modulation of a packet or of a TX request
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Modulation: u8, "modulation" {
        #[default]
        Default = 0x00,
        Lora = 0x10,
        Fsk = 0x20,
        Gfsk = 0x21,
    }
}

impl Modulation {
    /// True for FSK and GFSK
    pub fn is_fsk(self) -> bool {
        matches!(self, Modulation::Fsk | Modulation::Gfsk)
    }
}

impl fmt::Display for Modulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modulation::Default => write!(f, "default"),
            Modulation::Lora => write!(f, "LoRa"),
            Modulation::Fsk => write!(f, "FSK"),
            Modulation::Gfsk => write!(f, "GFSK"),
        }
    }
}

coded_enum! {
    /// Channel bandwidth (LoRa RX/TX, FSK RX)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub enum Bandwidth: u8, "bandwidth" {
        #[default]
        Default = 0x00,
        Khz500 = 0x04,
        Khz250 = 0x08,
        Khz125 = 0x0C,
    }
}

impl Bandwidth {
    /// Bandwidth in Hz, `None` for `Default`
    pub fn hz(self) -> Option<u32> {
        match self {
            Bandwidth::Default => None,
            Bandwidth::Khz500 => Some(500_000),
            Bandwidth::Khz250 => Some(250_000),
            Bandwidth::Khz125 => Some(125_000),
        }
    }

    /// Inverse of [`Bandwidth::hz`]; `0` maps to `Default`
    pub fn from_hz(hz: u32) -> Option<Self> {
        match hz {
            0 => Some(Bandwidth::Default),
            500_000 => Some(Bandwidth::Khz500),
            250_000 => Some(Bandwidth::Khz250),
            125_000 => Some(Bandwidth::Khz125),
            _ => None,
        }
    }
}

// Configuration files carry bandwidths in Hz.
impl Serialize for Bandwidth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.hz().unwrap_or(0))
    }
}

impl<'de> Deserialize<'de> for Bandwidth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hz = u32::deserialize(deserializer)?;
        Bandwidth::from_hz(hz)
            .ok_or_else(|| de::Error::custom(format!("unsupported bandwidth: {hz} Hz")))
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.hz() {
            Some(hz) => write!(f, "{}kHz", hz / 1000),
            None => write!(f, "default"),
        }
    }
}

/// Datarate of a channel or packet
///
/// LoRa values are spreading factors and keep their hardware bitmask codes;
/// `LoraMulti` is the union of SF7..SF12 accepted by multi-SF demodulators.
/// FSK datarates are bitrates in bps and have no single-byte code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataRate {
    #[default]
    Default,
    Sf7,
    Sf8,
    Sf9,
    Sf10,
    Sf11,
    Sf12,
    LoraMulti,
    Fsk(u32),
}

impl DataRate {
    /// Raw hardware code; FSK bitrates have none
    pub fn code(self) -> Option<u8> {
        match self {
            DataRate::Default => Some(0x00),
            DataRate::Sf7 => Some(0x02),
            DataRate::Sf8 => Some(0x04),
            DataRate::Sf9 => Some(0x08),
            DataRate::Sf10 => Some(0x10),
            DataRate::Sf11 => Some(0x20),
            DataRate::Sf12 => Some(0x40),
            DataRate::LoraMulti => Some(0x7E),
            DataRate::Fsk(_) => None,
        }
    }

    /// Spreading factor of a single-SF LoRa datarate
    pub fn spreading_factor(self) -> Option<u8> {
        match self {
            DataRate::Sf7 => Some(7),
            DataRate::Sf8 => Some(8),
            DataRate::Sf9 => Some(9),
            DataRate::Sf10 => Some(10),
            DataRate::Sf11 => Some(11),
            DataRate::Sf12 => Some(12),
            _ => None,
        }
    }

    /// True for exactly one LoRa spreading factor
    pub fn is_single_sf(self) -> bool {
        self.spreading_factor().is_some()
    }
}

impl TryFrom<u8> for DataRate {
    type Error = UnknownCode;

    fn try_from(code: u8) -> Result<Self, UnknownCode> {
        match code {
            0x00 => Ok(DataRate::Default),
            0x02 => Ok(DataRate::Sf7),
            0x04 => Ok(DataRate::Sf8),
            0x08 => Ok(DataRate::Sf9),
            0x10 => Ok(DataRate::Sf10),
            0x20 => Ok(DataRate::Sf11),
            0x40 => Ok(DataRate::Sf12),
            0x7E => Ok(DataRate::LoraMulti),
            other => Err(UnknownCode {
                kind: "datarate",
                code: other as i32,
            }),
        }
    }
}

impl fmt::Display for DataRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataRate::Default => write!(f, "default"),
            DataRate::LoraMulti => write!(f, "SF7-12"),
            DataRate::Fsk(bps) => write!(f, "{bps}bps"),
            sf => write!(f, "SF{}", sf.spreading_factor().unwrap_or(0)),
        }
    }
}

coded_enum! {
    /// LoRa forward error correction rate
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub enum CodeRate: u8, "coderate" {
        #[default]
        #[serde(rename = "default")]
        Default = 0x00,
        #[serde(rename = "4/5")]
        Cr4_5 = 0x11,
        #[serde(rename = "4/6")]
        Cr4_6 = 0x12,
        #[serde(rename = "4/7")]
        Cr4_7 = 0x13,
        #[serde(rename = "4/8")]
        Cr4_8 = 0x14,
    }
}

impl CodeRate {
    /// Redundancy index used by the time-on-air formula (4/5 → 1 .. 4/8 → 4)
    pub fn redundancy(self) -> Option<u8> {
        match self {
            CodeRate::Default => None,
            CodeRate::Cr4_5 => Some(1),
            CodeRate::Cr4_6 => Some(2),
            CodeRate::Cr4_7 => Some(3),
            CodeRate::Cr4_8 => Some(4),
        }
    }
}

coded_enum! {
    /// CRC outcome of a received packet
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CrcStatus: i8, "CRC status" {
        Error = 0,
        Ok = 1,
        #[default]
        Absent = -1,
    }
}

coded_enum! {
    /// What starts a transmission
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TxMode: u8, "TX mode" {
        /// As soon as the modem is free
        #[default]
        Immediate = 0,
        /// When the microsecond counter reaches `count_us`
        Timestamped = 1,
        /// On the next GPS pulse-per-second edge
        OnGps = 2,
        /// On the next external trigger event
        OnEvent = 3,
        /// `count_us` after the next GPS pulse-per-second edge
        GpsDelayed = 4,
        /// `count_us` after the next external trigger event
        EventDelayed = 5,
    }
}

impl TxMode {
    /// Started by the external trigger input
    pub fn is_event_gated(self) -> bool {
        matches!(self, TxMode::OnEvent | TxMode::EventDelayed)
    }

    /// Started by the GPS pulse-per-second input
    pub fn is_gps_gated(self) -> bool {
        matches!(self, TxMode::OnGps | TxMode::GpsDelayed)
    }

    /// True when `count_us` holds a delay after the trigger
    pub fn is_delayed(self) -> bool {
        matches!(self, TxMode::GpsDelayed | TxMode::EventDelayed)
    }
}

impl fmt::Display for TxMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TxMode::Immediate => "immediate",
            TxMode::Timestamped => "timestamped",
            TxMode::OnGps => "on-GPS",
            TxMode::OnEvent => "on-event",
            TxMode::GpsDelayed => "GPS-delayed",
            TxMode::EventDelayed => "event-delayed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_hardware_values() {
        assert_eq!(Modulation::Lora.code(), 0x10);
        assert_eq!(Modulation::Gfsk.code(), 0x21);
        assert_eq!(Bandwidth::Khz125.code(), 0x0C);
        assert_eq!(DataRate::LoraMulti.code(), Some(0x7E));
        assert_eq!(DataRate::Sf12.code(), Some(0x40));
        assert_eq!(CodeRate::Cr4_8.code(), 0x14);
        assert_eq!(CrcStatus::Absent.code(), -1);
        assert_eq!(TxMode::EventDelayed.code(), 5);
    }

    #[test]
    fn test_default_encodes_as_zero() {
        assert_eq!(Modulation::default().code(), 0);
        assert_eq!(Bandwidth::default().code(), 0);
        assert_eq!(DataRate::default().code(), Some(0));
        assert_eq!(CodeRate::default().code(), 0);
    }

    #[test]
    fn test_unknown_codes_rejected() {
        assert!(Modulation::try_from(0x11u8).is_err());
        assert!(Bandwidth::try_from(0x05u8).is_err());
        assert!(DataRate::try_from(0x03u8).is_err());
        assert!(TxMode::try_from(6u8).is_err());

        let err = CrcStatus::try_from(2i8).unwrap_err();
        assert_eq!(err.kind, "CRC status");
        assert_eq!(err.code, 2);
    }

    #[test]
    fn test_known_codes_decode() {
        assert_eq!(TxMode::try_from(2u8).unwrap(), TxMode::OnGps);
        assert_eq!(CrcStatus::try_from(0i8).unwrap(), CrcStatus::Error);
        assert_eq!(DataRate::try_from(0x08u8).unwrap(), DataRate::Sf9);
        assert_eq!(CodeRate::try_from(0x12u8).unwrap(), CodeRate::Cr4_6);
    }

    #[test]
    fn test_fsk_datarate_has_no_code() {
        assert_eq!(DataRate::Fsk(50_000).code(), None);
        assert!(!DataRate::Fsk(50_000).is_single_sf());
        assert!(!DataRate::LoraMulti.is_single_sf());
    }

    #[test]
    fn test_bandwidth_serializes_as_hz() {
        let json = serde_json::to_string(&Bandwidth::Khz250).unwrap();
        assert_eq!(json, "250000");
        let bw: Bandwidth = serde_json::from_str("0").unwrap();
        assert_eq!(bw, Bandwidth::Default);
        assert!(serde_json::from_str::<Bandwidth>("200000").is_err());
    }

    #[test]
    fn test_datarate_serde_names() {
        assert_eq!(serde_json::to_string(&DataRate::Sf9).unwrap(), "\"sf9\"");
        assert_eq!(
            serde_json::to_string(&DataRate::Fsk(50_000)).unwrap(),
            "{\"fsk\":50000}"
        );
        let dr: DataRate = serde_json::from_str("\"lora_multi\"").unwrap();
        assert_eq!(dr, DataRate::LoraMulti);
    }

    #[test]
    fn test_tx_mode_classes() {
        assert!(TxMode::EventDelayed.is_event_gated());
        assert!(TxMode::EventDelayed.is_delayed());
        assert!(TxMode::OnGps.is_gps_gated());
        assert!(!TxMode::OnGps.is_delayed());
        assert!(!TxMode::Timestamped.is_event_gated());
    }
}
