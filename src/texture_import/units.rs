//! 长度单位
//!
//! 贴图宽高在内部统一以厘米保存，单位只影响默认值、取值范围与显示。

use serde::{Deserialize, Serialize};

const CENTIMETERS_PER_INCH: f32 = 2.54;

/// 用户偏好的长度单位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    Millimeter,
    Centimeter,
    Meter,
    Inch,
}

impl LengthUnit {
    pub fn is_metric(self) -> bool {
        !matches!(self, Self::Inch)
    }

    pub fn inch_to_centimeter(inches: f32) -> f32 {
        inches * CENTIMETERS_PER_INCH
    }

    pub fn centimeter_to_inch(centimeters: f32) -> f32 {
        centimeters / CENTIMETERS_PER_INCH
    }

    /// 允许输入的最小长度（厘米）。
    pub fn minimum_length(self) -> f32 {
        match self {
            Self::Millimeter | Self::Centimeter | Self::Meter => 0.1,
            Self::Inch => Self::inch_to_centimeter(0.125),
        }
    }

    /// 允许输入的最大长度（厘米）。
    pub fn maximum_length(self) -> f32 {
        match self {
            Self::Millimeter | Self::Centimeter | Self::Meter => 100_000.0,
            Self::Inch => Self::inch_to_centimeter(39_370.0),
        }
    }

    /// 将长度限制在单位允许的范围内。
    pub fn clamp(self, centimeters: f32) -> f32 {
        centimeters.clamp(self.minimum_length(), self.maximum_length())
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Millimeter => "mm",
            Self::Centimeter => "cm",
            Self::Meter => "m",
            Self::Inch => "inch",
        }
    }

    /// 以当前单位格式化厘米值。
    pub fn format(self, centimeters: f32) -> String {
        match self {
            Self::Millimeter => format!("{:.0} mm", centimeters * 10.0),
            Self::Centimeter => format!("{:.1} cm", centimeters),
            Self::Meter => format!("{:.3} m", centimeters / 100.0),
            Self::Inch => format!("{:.2}\"", Self::centimeter_to_inch(centimeters)),
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "mm" | "millimeter" => Some(Self::Millimeter),
            "cm" | "centimeter" => Some(Self::Centimeter),
            "m" | "meter" => Some(Self::Meter),
            "in" | "inch" => Some(Self::Inch),
            _ => None,
        }
    }
}
