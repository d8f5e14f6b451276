use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Summary vector categories, decided from the keyword mnemonic alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VarType {
    Invalid,
    Aquifer,
    Well,
    Region,
    Field,
    Group,
    Block,
    Completion,
    LocalBlock,
    LocalCompletion,
    LocalWell,
    Network,
    RegionToRegion,
    Segment,
    Misc,
}

const SPECIAL_MISC: &[&str] = &[
    "NEWTON", "NAIMFRAC", "NLINEARS", "NLINSMIN", "NLINSMAX", "ELAPSED", "MAXDPR", "MAXDSO",
    "MAXDSG", "MAXDSW", "STEPTYPE", "WNEWTON",
];

/// Classifies a summary mnemonic.
///
/// Never fails: anything without a recognised leading character is MISC, which
/// also swallows typos such as `XOPR`.
pub fn classify(keyword: &str) -> VarType {
    if SPECIAL_MISC.contains(&keyword) {
        return VarType::Misc;
    }

    let bytes = keyword.as_bytes();
    match bytes.first() {
        Some(b'A') => VarType::Aquifer,
        Some(b'B') => VarType::Block,
        Some(b'C') => VarType::Completion,
        Some(b'F') => VarType::Field,
        Some(b'G') => VarType::Group,
        Some(b'L') => match bytes.get(1) {
            Some(b'B') => VarType::LocalBlock,
            Some(b'C') => VarType::LocalCompletion,
            Some(b'W') => VarType::LocalWell,
            _ => VarType::Misc,
        },
        Some(b'N') => VarType::Network,
        Some(b'R') => {
            if keyword == "RNLF" || bytes.get(2) == Some(&b'F') {
                VarType::RegionToRegion
            } else {
                VarType::Region
            }
        }
        Some(b'S') => VarType::Segment,
        Some(b'W') => VarType::Well,
        _ => VarType::Misc,
    }
}

impl VarType {
    pub const fn needs_wgname(self) -> bool {
        matches!(
            self,
            Self::Completion | Self::Group | Self::Well | Self::Segment
        )
    }

    pub const fn needs_num(self) -> bool {
        matches!(
            self,
            Self::Completion
                | Self::Aquifer
                | Self::Region
                | Self::RegionToRegion
                | Self::Block
                | Self::Segment
        )
    }

    pub const fn is_local(self) -> bool {
        matches!(
            self,
            Self::LocalBlock | Self::LocalCompletion | Self::LocalWell
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invalid => "INVALID",
            Self::Aquifer => "AQUIFER",
            Self::Well => "WELL",
            Self::Region => "REGION",
            Self::Field => "FIELD",
            Self::Group => "GROUP",
            Self::Block => "BLOCK",
            Self::Completion => "COMPLETION",
            Self::LocalBlock => "LOCAL_BLOCK",
            Self::LocalCompletion => "LOCAL_COMPLETION",
            Self::LocalWell => "LOCAL_WELL",
            Self::Network => "NETWORK",
            Self::RegionToRegion => "REGION_TO_REGION",
            Self::Segment => "SEGMENT",
            Self::Misc => "MISC",
        }
    }
}

impl Display for VarType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
