use serde::Serialize;
use url::Url;

/// Where a routing table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableOrigin {
    Store,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    Origin(Url),
    /// Known app whose origin is unknown right now
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub prefix: String,
    pub target: RouteTarget,
}

/// Ordered prefix table; first match wins. Never mutated after construction,
/// a refresh builds a new table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    entries: Vec<RouteEntry>,
    origin: TableOrigin,
}

/// Apps the portal knows about even when the config store is down
pub const KNOWN_APP_PREFIXES: &[&str] = &[
    "l10",
    "eos-l10",
    "pharma",
    "pharma-scheduling",
    "handouts",
    "kiosk",
    "checkin-kiosk",
    "inventory",
    "medication-auth",
    "meds",
    "clinical-staffing",
    "staffing",
    "platform-dashboard",
    "dashboard",
    "ai-receptionist",
    "receptionist",
    "call-center",
    "call-center-ops",
    "compliance",
    "compliance-training",
    "config-dashboard",
    "integration",
    "integration-status",
    "socials",
    "socials-reviews",
    "batch",
    "batch-closeout",
];

pub fn normalize_prefix(prefix: &str) -> String {
    prefix.trim().trim_matches('/').to_string()
}

impl RoutingTable {
    /// Build from `(prefix, url)` pairs in order. Blank prefixes, duplicate
    /// prefixes and unparsable URLs are skipped and returned as rejects.
    pub fn from_pairs<I, P, U>(pairs: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = (P, U)>,
        P: AsRef<str>,
        U: AsRef<str>,
    {
        let mut entries: Vec<RouteEntry> = Vec::new();
        let mut rejected = Vec::new();

        for (prefix, url) in pairs {
            let prefix = normalize_prefix(prefix.as_ref());
            if prefix.is_empty() || entries.iter().any(|e| e.prefix == prefix) {
                rejected.push(prefix);
                continue;
            }

            match Url::parse(url.as_ref().trim()) {
                Ok(base) if !base.cannot_be_a_base() => entries.push(RouteEntry {
                    prefix,
                    target: RouteTarget::Origin(base),
                }),
                _ => rejected.push(prefix),
            }
        }

        (
            Self {
                entries,
                origin: TableOrigin::Store,
            },
            rejected,
        )
    }

    pub fn fallback() -> Self {
        Self {
            entries: KNOWN_APP_PREFIXES
                .iter()
                .map(|prefix| RouteEntry {
                    prefix: prefix.to_string(),
                    target: RouteTarget::Unavailable,
                })
                .collect(),
            origin: TableOrigin::Fallback,
        }
    }

    pub fn origin(&self) -> TableOrigin {
        self.origin
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry whose prefix owns `path`, with the remaining suffix.
    /// `/inventory` and `/inventory/items` match `inventory`; `/inventorying` does not.
    pub fn lookup<'a, 'p>(&'a self, path: &'p str) -> Option<(&'a RouteEntry, &'p str)> {
        let rest = path.strip_prefix('/')?;
        self.entries.iter().find_map(|entry| {
            let suffix = rest.strip_prefix(entry.prefix.as_str())?;
            if suffix.is_empty() || suffix.starts_with('/') {
                Some((entry, suffix))
            } else {
                None
            }
        })
    }
}
