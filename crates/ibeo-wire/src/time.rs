use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch.
pub const NTP_UNIX_OFFSET_SECS: u64 = 2_208_988_800;

/// 64-bit NTP timestamp as sent by the sensor.
///
/// The high 32 bits count seconds since 1900-01-01, the low 32 bits are
/// fractional seconds in units of 2^-32 s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NtpTime(pub u64);

impl NtpTime {
    pub fn from_parts(seconds: u32, fraction: u32) -> Self {
        Self((u64::from(seconds) << 32) | u64::from(fraction))
    }

    pub fn seconds(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub fn fraction(self) -> u32 {
        self.0 as u32
    }

    /// Nanoseconds represented by the fractional part, rounded down.
    pub fn subsec_nanos(self) -> u32 {
        ((u64::from(self.fraction()) * 1_000_000_000) >> 32) as u32
    }

    /// Convert to wall-clock time. Timestamps before 1970 clamp to the Unix epoch.
    pub fn to_system_time(self) -> SystemTime {
        let secs = u64::from(self.seconds());
        match secs.checked_sub(NTP_UNIX_OFFSET_SECS) {
            Some(unix_secs) => UNIX_EPOCH + Duration::new(unix_secs, self.subsec_nanos()),
            None => UNIX_EPOCH,
        }
    }

    /// Convert from wall-clock time. Times before 1970 clamp to the Unix epoch;
    /// the seconds field wraps at the end of NTP era 0 (2036).
    pub fn from_system_time(time: SystemTime) -> Self {
        let since_unix = time.duration_since(UNIX_EPOCH).unwrap_or_default();
        let seconds = since_unix.as_secs().wrapping_add(NTP_UNIX_OFFSET_SECS) as u32;
        let fraction = ((u64::from(since_unix.subsec_nanos()) << 32) / 1_000_000_000) as u32;
        Self::from_parts(seconds, fraction)
    }

    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }
}

impl From<u64> for NtpTime {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<NtpTime> for u64 {
    fn from(time: NtpTime) -> u64 {
        time.0
    }
}
