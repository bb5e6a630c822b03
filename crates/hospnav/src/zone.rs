//! Zone routing for back-navigation and page titles.
//!
//! Every page belongs to one of three top-level sections: the family
//! (caregiver) area, the elder (patient) area, and medical services. A
//! "back" action returns to the home page of the section the current path
//! belongs to.

use serde::{Deserialize, Serialize};

/// A top-level application section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// Family caregiver pages.
    Family,
    /// Elder patient pages, and the fallback for anything unknown.
    #[default]
    Elder,
    /// Hospital medical-service pages.
    Medical,
}

impl Zone {
    /// All zones in classification priority order.
    pub const ALL: [Zone; 3] = [Zone::Family, Zone::Elder, Zone::Medical];

    /// Path prefixes that place a path in this zone.
    #[must_use]
    pub fn prefixes(self) -> &'static [&'static str] {
        match self {
            Self::Family => FAMILY_PREFIXES,
            Self::Elder => ELDER_PREFIXES,
            Self::Medical => MEDICAL_PREFIXES,
        }
    }

    /// Marker searched for in a referrer when the path itself is unknown.
    #[must_use]
    pub fn referrer_marker(self) -> &'static str {
        match self {
            Self::Family => "/family",
            Self::Elder => "/elder",
            Self::Medical => "/medical",
        }
    }

    /// The page a back action lands on for this zone.
    #[must_use]
    pub fn home_path(self) -> &'static str {
        match self {
            Self::Family => "/family-assistance",
            Self::Elder => "/elder",
            Self::Medical => "/medical-services",
        }
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Family => write!(f, "family"),
            Self::Elder => write!(f, "elder"),
            Self::Medical => write!(f, "medical"),
        }
    }
}

const FAMILY_PREFIXES: &[&str] = &[
    "/family",
    "/medication-plan",
    "/medication-recognition",
    "/medication-box",
    "/health-records",
];

const ELDER_PREFIXES: &[&str] = &[
    "/elder",
    "/emergency",
    "/care-paths",
    "/my-routes",
    "/profile",
];

const MEDICAL_PREFIXES: &[&str] = &[
    "/medical",
    "/departments",
    "/route-planner",
    "/doctors",
    "/registration",
    "/hospital-map",
];

/// Title shown for any path without its own entry.
pub const FALLBACK_TITLE: &str = "Hospital Navigation Assistant";

const PATH_TITLES: &[(&str, &str)] = &[
    ("/", FALLBACK_TITLE),
    ("/elder", "Elder Home"),
    ("/emergency", "Emergency Contacts"),
    ("/care-paths", "Care Paths"),
    ("/my-routes", "My Routes"),
    ("/profile", "My Profile"),
    ("/family-assistance", "Family Assistance"),
    ("/family-members", "Family Members"),
    ("/family-members/edit", "Edit Family Member"),
    ("/medication-plan", "Medication Plan"),
    ("/medication-recognition", "Medication Recognition"),
    ("/medication-recognition/history", "Recognition History"),
    ("/medication-box", "Medication Box"),
    ("/health-records", "Health Records"),
    ("/medical-services", "Medical Services"),
    ("/departments", "Department Directory"),
    ("/route-planner", "Route Planner"),
    ("/doctors", "Find a Doctor"),
    ("/registration", "Registration"),
    ("/hospital-map", "Hospital Map"),
];

/// Drop any `?query` or `#fragment` from a path.
#[must_use]
pub fn strip_query(path: &str) -> &str {
    path.find(['?', '#']).map_or(path, |idx| &path[..idx])
}

/// Classify a request path into a zone.
///
/// Path prefixes are checked first, in family, elder, medical order. When
/// nothing matches, the referrer (if any) is searched for a coarse zone
/// marker in the same order. Anything still unknown belongs to the elder zone.
#[must_use]
pub fn classify_zone(path: &str, referrer: Option<&str>) -> Zone {
    let path = strip_query(path);

    if let Some(zone) = Zone::ALL
        .into_iter()
        .find(|zone| zone.prefixes().iter().any(|p| path.starts_with(p)))
    {
        return zone;
    }

    referrer
        .and_then(|referrer| {
            Zone::ALL
                .into_iter()
                .find(|zone| referrer.contains(zone.referrer_marker()))
        })
        .unwrap_or_default()
}

/// Display title for a path, or [`FALLBACK_TITLE`] if it has none.
#[must_use]
pub fn title_for_path(path: &str) -> &'static str {
    let path = strip_query(path);
    PATH_TITLES
        .iter()
        .find(|(key, _)| *key == path)
        .map_or(FALLBACK_TITLE, |(_, title)| *title)
}

/// Where a back action from `path` should land.
#[must_use]
pub fn back_target(path: &str, referrer: Option<&str>) -> &'static str {
    classify_zone(path, referrer).home_path()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_family_path() {
        assert_eq!(classify_zone("/medication-plan/details/7", None), Zone::Family);
        assert_eq!(classify_zone("/family-assistance", None), Zone::Family);
    }

    #[test]
    fn test_classify_elder_path() {
        assert_eq!(classify_zone("/emergency", None), Zone::Elder);
        assert_eq!(classify_zone("/my-routes/3", None), Zone::Elder);
    }

    #[test]
    fn test_classify_medical_path_with_query() {
        assert_eq!(classify_zone(strip_query("/route-planner?x=1"), None), Zone::Medical);
        assert_eq!(classify_zone("/route-planner?x=1", None), Zone::Medical);
    }

    #[test]
    fn test_classify_unknown_defaults_to_elder() {
        assert_eq!(classify_zone("/unknown/path", None), Zone::Elder);
        assert_eq!(classify_zone("", None), Zone::Elder);
    }

    #[test]
    fn test_classify_falls_back_to_referrer() {
        assert_eq!(
            classify_zone("/settings", Some("https://example.org/family-members")),
            Zone::Family
        );
        assert_eq!(
            classify_zone("/settings", Some("/medical-services?tab=2")),
            Zone::Medical
        );
        assert_eq!(classify_zone("/settings", Some("/elder")), Zone::Elder);
        assert_eq!(classify_zone("/settings", Some("/nowhere")), Zone::Elder);
    }

    #[test]
    fn test_path_match_beats_referrer() {
        assert_eq!(
            classify_zone("/departments", Some("/family-assistance")),
            Zone::Medical
        );
    }

    #[test]
    fn test_referrer_priority_order() {
        // Both markers present: family is checked first
        assert_eq!(
            classify_zone("/x", Some("/medical/then/family")),
            Zone::Family
        );
    }

    #[test]
    fn test_prefix_lists_are_disjoint() {
        for zone in Zone::ALL {
            for other in Zone::ALL.into_iter().filter(|z| *z != zone) {
                for a in zone.prefixes() {
                    for b in other.prefixes() {
                        assert!(
                            !a.starts_with(b) && !b.starts_with(a),
                            "{zone} prefix {a} overlaps {other} prefix {b}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_title_for_known_path() {
        assert_eq!(title_for_path("/family-assistance"), "Family Assistance");
        assert_eq!(title_for_path("/route-planner?to=Cardiology"), "Route Planner");
    }

    #[test]
    fn test_title_fallback() {
        assert_eq!(title_for_path("/nonexistent"), FALLBACK_TITLE);
        assert_eq!(title_for_path("/family-assistance/extra"), FALLBACK_TITLE);
    }

    #[test]
    fn test_home_paths_classify_into_their_zone() {
        for zone in Zone::ALL {
            assert_eq!(classify_zone(zone.home_path(), None), zone);
        }
    }

    #[test]
    fn test_back_target() {
        assert_eq!(back_target("/medication-box", None), "/family-assistance");
        assert_eq!(back_target("/doctors/12", None), "/medical-services");
        assert_eq!(back_target("/unknown", None), "/elder");
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("/a?b=c"), "/a");
        assert_eq!(strip_query("/a#top"), "/a");
        assert_eq!(strip_query("/a"), "/a");
    }

    #[test]
    fn test_zone_display() {
        assert_eq!(Zone::Family.to_string(), "family");
        assert_eq!(Zone::Elder.to_string(), "elder");
        assert_eq!(Zone::Medical.to_string(), "medical");
    }
}
