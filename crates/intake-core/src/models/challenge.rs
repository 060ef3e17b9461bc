use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;

/// Attack patterns the upload flows report to the challenge signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    OversizedUpload,
    DisallowedType,
    UnexpectedZipPathWrite,
    DeprecatedInterfaceUsed,
    FileDisclosureViaExpansion,
    TimeoutDenialOfService,
}

impl ChallengeKind {
    pub const ALL: [ChallengeKind; 6] = [
        ChallengeKind::OversizedUpload,
        ChallengeKind::DisallowedType,
        ChallengeKind::UnexpectedZipPathWrite,
        ChallengeKind::DeprecatedInterfaceUsed,
        ChallengeKind::FileDisclosureViaExpansion,
        ChallengeKind::TimeoutDenialOfService,
    ];
}

impl Display for ChallengeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ChallengeKind::OversizedUpload => write!(f, "oversized-upload"),
            ChallengeKind::DisallowedType => write!(f, "disallowed-type"),
            ChallengeKind::UnexpectedZipPathWrite => write!(f, "unexpected-zip-path-write"),
            ChallengeKind::DeprecatedInterfaceUsed => write!(f, "deprecated-interface-used"),
            ChallengeKind::FileDisclosureViaExpansion => write!(f, "file-disclosure-via-expansion"),
            ChallengeKind::TimeoutDenialOfService => write!(f, "timeout-denial-of-service"),
        }
    }
}

impl FromStr for ChallengeKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oversized-upload" => Ok(ChallengeKind::OversizedUpload),
            "disallowed-type" => Ok(ChallengeKind::DisallowedType),
            "unexpected-zip-path-write" => Ok(ChallengeKind::UnexpectedZipPathWrite),
            "deprecated-interface-used" => Ok(ChallengeKind::DeprecatedInterfaceUsed),
            "file-disclosure-via-expansion" => Ok(ChallengeKind::FileDisclosureViaExpansion),
            "timeout-denial-of-service" => Ok(ChallengeKind::TimeoutDenialOfService),
            _ => Err(anyhow::anyhow!("Invalid challenge kind: {}", s)),
        }
    }
}
