//! Protocol-defined tags.
//!
//! The numeric values are fixed by the sensor firmware and must not be
//! renumbered. Wire structs keep the raw `u16` so values outside these enums
//! still survive a decode/encode cycle.

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[repr(u16)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value, )+
        }

        impl $name {
            /// Look up a raw wire value.
            pub fn from_u16(value: u16) -> Option<Self> {
                match value {
                    $( $value => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// The raw wire value.
            pub fn as_u16(self) -> u16 {
                self as u16
            }

            /// Protocol name, as used in the sensor documentation.
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => stringify!($variant), )+
                }
            }
        }

        impl From<$name> for u16 {
            fn from(value: $name) -> u16 {
                value.as_u16()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{} ({:#06x})", self.name(), self.as_u16())
            }
        }
    };
}

wire_enum! {
    /// Payload kind carried in the frame header.
    pub enum DataType {
        CommandData = 0x2010,
        ReplyData = 0x2020,
        ErrorWarningData = 0x2030,
        ScanData = 0x2202,
        ObjectData = 0x2221,
        VehicleData = 0x2805,
    }
}

wire_enum! {
    /// First field of every command and reply body.
    pub enum Command {
        Reset = 0x0000,
        GetStatus = 0x0001,
        SaveConfig = 0x0004,
        SetParameter = 0x0010,
        GetParameter = 0x0011,
        ResetDefaultParameters = 0x001A,
        StartMeasure = 0x0020,
        StopMeasure = 0x0021,
        /// Carries an NTP timestamp (seconds since 1900 in the high word).
        SetNtpTimestampSync = 0x0034,
    }
}

wire_enum! {
    /// Addressable sensor parameters.
    pub enum ParameterIndex {
        IpAddress = 0x1000,
        TcpPort = 0x1001,
        SubnetMask = 0x1002,
        Gateway = 0x1003,
        CustomerProcessingSwitch0 = 0x1004,
        CanBaseId = 0x1010,
        CanBaudRate = 0x1011,
        DataOutputFlag = 0x1012,
        MaxObjectsViaCan = 0x1013,
        ContourPointDensity = 0x1014,
        ObjectPriorizationCriterion = 0x1015,
        CanObjectDataOptions = 0x1016,
        MinimumObjectAge = 0x1017,
        MaximumPredictionAge = 0x1018,
        InterfaceFlags = 0x1019,
        StartAngle = 0x1100,
        EndAngle = 0x1101,
        ScanFrequency = 0x1102,
        SyncAngleOffset = 0x1103,
        AngularResolutionType = 0x1104,
        AngleTicksPerRotation = 0x1105,
        SensorMountingX = 0x1200,
        SensorMountingY = 0x1201,
        SensorMountingZ = 0x1202,
        SensorMountingYaw = 0x1203,
        SensorMountingPitch = 0x1204,
        SensorMountingRoll = 0x1205,
        VehicleFrontToFrontAxle = 0x1206,
        FrontAxleToRearAxle = 0x1207,
        RearAxleToVehicleRear = 0x1208,
        VehicleWidth = 0x1209,
        SteerRatioType = 0x120A,
        SteerRatioPoly0 = 0x120C,
        SteerRatioPoly1 = 0x120D,
        SteerRatioPoly2 = 0x120E,
        SteerRatioPoly3 = 0x120F,
        VehicleMotionDataFlags = 0x1210,
        DeviceType = 0x3301,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_values_are_stable() {
        assert_eq!(DataType::CommandData.as_u16(), 0x2010);
        assert_eq!(DataType::ReplyData.as_u16(), 0x2020);
        assert_eq!(DataType::ScanData.as_u16(), 0x2202);
        assert_eq!(DataType::ObjectData.as_u16(), 0x2221);
        assert_eq!(DataType::VehicleData.as_u16(), 0x2805);
        assert_eq!(DataType::ErrorWarningData.as_u16(), 0x2030);
    }

    #[test]
    fn from_u16_rejects_unknown_values() {
        assert_eq!(DataType::from_u16(0x2202), Some(DataType::ScanData));
        assert_eq!(DataType::from_u16(0x1234), None);
        assert_eq!(Command::from_u16(0x001A), Some(Command::ResetDefaultParameters));
        assert_eq!(Command::from_u16(0x0002), None);
        assert_eq!(
            ParameterIndex::from_u16(0x120C),
            Some(ParameterIndex::SteerRatioPoly0)
        );
        assert_eq!(ParameterIndex::from_u16(0x120B), None);
    }

    #[test]
    fn display_includes_name_and_value() {
        assert_eq!(
            Command::SetNtpTimestampSync.to_string(),
            "SetNtpTimestampSync (0x0034)"
        );
        assert_eq!(u16::from(ParameterIndex::DeviceType), 0x3301);
    }
}
