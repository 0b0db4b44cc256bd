//! Gateway Hardware Constants
//!
//! This module defines constants fixed by the concentrator hardware: chain
//! counts, buffer sizes, the reference RF bands and the default values that
//! stand in for a `0` ("use hardware default") field.

/// Number of RF chains (radio front-ends)
pub const RF_CHAIN_COUNT: usize = 2;

/// Number of IF chains (demodulator channels)
pub const IF_CHAIN_COUNT: usize = 10;

/// Capacity of the hardware packet FIFO, in packets
pub const PKT_FIFO_SIZE: usize = 8;

/// Size of the payload data buffer, in bytes
pub const MAX_PAYLOAD_SIZE: usize = 1024;

/// Instantaneous bandwidth of an RF front-end, in Hz
pub const RF_BANDWIDTH_HZ: u32 = 800_000;

/// Frequency of the RF reference oscillator
pub const XTAL_FREQ_HZ: u32 = 32_000_000;

/// PLL setting denominator when the numerator is 2^8 (SX125x radios)
pub const SX125X_PLL_DENOM: u32 = 15_625;

// ----------------------------------------------------------------------------
// Reference board RF bands, indexed by RF chain
// ----------------------------------------------------------------------------

pub const RF_RX_LOW_FREQ_HZ: [u32; RF_CHAIN_COUNT] = [863_000_000, 863_000_000];
pub const RF_RX_UP_FREQ_HZ: [u32; RF_CHAIN_COUNT] = [870_000_000, 870_000_000];
pub const RF_TX_LOW_FREQ_HZ: [u32; RF_CHAIN_COUNT] = [863_000_000, 863_000_000];
pub const RF_TX_UP_FREQ_HZ: [u32; RF_CHAIN_COUNT] = [870_000_000, 870_000_000];

/// Lowest TX power of the reference board gain table, in dBm
pub const TX_POWER_MIN_DBM: i8 = -6;

/// Highest TX power of the reference board gain table, in dBm
pub const TX_POWER_MAX_DBM: i8 = 27;

// ----------------------------------------------------------------------------
// Modem limits and defaults
// ----------------------------------------------------------------------------

/// Largest payload a LoRa or FSK modem can put on air
pub const MODEM_MAX_PAYLOAD_SIZE: usize = 255;

/// Default LoRa preamble length, in symbols
pub const LORA_DEFAULT_PREAMBLE: u16 = 8;

/// Shortest LoRa preamble the TX modem accepts, in symbols
pub const LORA_MIN_PREAMBLE: u16 = 6;

/// Default FSK preamble length, in bytes
pub const FSK_DEFAULT_PREAMBLE: u16 = 5;

/// FSK bitrate range supported by the FSK modem, in bps
pub const FSK_DATARATE_MIN: u32 = 500;
pub const FSK_DATARATE_MAX: u32 = 250_000;

/// FSK bitrate used when the configuration leaves it at default
pub const FSK_DEFAULT_DATARATE: u32 = 50_000;

/// FSK frequency deviation range, in kHz
pub const FSK_FDEV_MIN_KHZ: u16 = 1;
pub const FSK_FDEV_MAX_KHZ: u16 = 200;

/// Half the range of the 32-bit microsecond counter. A target counter value
/// less than this far ahead of "now" is considered to be in the future.
pub const COUNTER_HALF_RANGE: u32 = 1 << 31;
