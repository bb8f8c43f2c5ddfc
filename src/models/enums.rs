//! Fixed equipment enumerations
//!
//! The backend stores categories and statuses by their Japanese display
//! labels, so those labels are the serialized form. Each variant also has an
//! ASCII slug for configuration, URLs and logs.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EquipmentCategory
// ---------------------------------------------------------------------------

/// Equipment category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EquipmentCategory {
    #[serde(rename = "電子機器")]
    Electronics,
    #[serde(rename = "オフィス家具")]
    OfficeFurniture,
    #[serde(rename = "工具・作業用品")]
    Tools,
    #[serde(rename = "AV機器・周辺機器")]
    AudioVisual,
    #[serde(rename = "消耗品")]
    Consumables,
    #[serde(rename = "防災・安全用品")]
    Safety,
    #[serde(rename = "レンタル備品")]
    Rental,
    #[serde(rename = "社用車関連品")]
    Vehicle,
}

impl EquipmentCategory {
    pub const ALL: [EquipmentCategory; 8] = [
        EquipmentCategory::Electronics,
        EquipmentCategory::OfficeFurniture,
        EquipmentCategory::Tools,
        EquipmentCategory::AudioVisual,
        EquipmentCategory::Consumables,
        EquipmentCategory::Safety,
        EquipmentCategory::Rental,
        EquipmentCategory::Vehicle,
    ];

    /// Display label, identical to the wire value
    pub fn label(&self) -> &'static str {
        match self {
            EquipmentCategory::Electronics => "電子機器",
            EquipmentCategory::OfficeFurniture => "オフィス家具",
            EquipmentCategory::Tools => "工具・作業用品",
            EquipmentCategory::AudioVisual => "AV機器・周辺機器",
            EquipmentCategory::Consumables => "消耗品",
            EquipmentCategory::Safety => "防災・安全用品",
            EquipmentCategory::Rental => "レンタル備品",
            EquipmentCategory::Vehicle => "社用車関連品",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            EquipmentCategory::Electronics => "electronics",
            EquipmentCategory::OfficeFurniture => "office-furniture",
            EquipmentCategory::Tools => "tools",
            EquipmentCategory::AudioVisual => "audio-visual",
            EquipmentCategory::Consumables => "consumables",
            EquipmentCategory::Safety => "safety",
            EquipmentCategory::Rental => "rental",
            EquipmentCategory::Vehicle => "vehicle",
        }
    }

    /// Strict lookup by wire label
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl std::fmt::Display for EquipmentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for EquipmentCategory {
    type Err = String;

    /// Accepts either the display label or the slug
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label() == s || c.slug().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Invalid equipment category: {}", s))
    }
}

// ---------------------------------------------------------------------------
// EquipmentStatus
// ---------------------------------------------------------------------------

/// Equipment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EquipmentStatus {
    #[serde(rename = "使用中")]
    InUse,
    #[serde(rename = "貸出中")]
    OnLoan,
    #[serde(rename = "利用可能")]
    Available,
    #[serde(rename = "廃棄")]
    Disposed,
}

impl EquipmentStatus {
    pub const ALL: [EquipmentStatus; 4] = [
        EquipmentStatus::InUse,
        EquipmentStatus::OnLoan,
        EquipmentStatus::Available,
        EquipmentStatus::Disposed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EquipmentStatus::InUse => "使用中",
            EquipmentStatus::OnLoan => "貸出中",
            EquipmentStatus::Available => "利用可能",
            EquipmentStatus::Disposed => "廃棄",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            EquipmentStatus::InUse => "in-use",
            EquipmentStatus::OnLoan => "on-loan",
            EquipmentStatus::Available => "available",
            EquipmentStatus::Disposed => "disposed",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }
}

impl std::fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for EquipmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|st| st.label() == s || st.slug().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Invalid equipment status: {}", s))
    }
}
