//! Hospital directory data and navigation links.
//!
//! Departments and emergency contacts are fixed sample data. The link
//! builders produce paths in the namespace [`crate::zone`] classifies.

use serde::Serialize;

use crate::records::Named;

/// A hospital department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Department {
    /// Department name.
    pub name: &'static str,
    /// Building and floor.
    pub location: &'static str,
    /// Short description of what the department treats.
    pub description: &'static str,
}

impl Named for Department {
    fn display_name(&self) -> &str {
        self.name
    }
}

/// A number to call in an emergency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmergencyContact {
    /// Who answers.
    pub name: &'static str,
    /// Number to dial.
    pub phone: &'static str,
    /// When to call it.
    pub description: &'static str,
}

impl Named for EmergencyContact {
    fn display_name(&self) -> &str {
        self.name
    }
}

const DEPARTMENTS: &[Department] = &[
    Department {
        name: "Cardiology",
        location: "Building A, Floor 3",
        description: "Heart disease, hypertension, arrhythmia",
    },
    Department {
        name: "Endocrinology",
        location: "Building A, Floor 4",
        description: "Diabetes, thyroid disorders",
    },
    Department {
        name: "Neurology",
        location: "Building B, Floor 2",
        description: "Stroke, dementia, Parkinson's disease",
    },
    Department {
        name: "Orthopedics",
        location: "Building B, Floor 3",
        description: "Fractures, joint pain, osteoporosis",
    },
    Department {
        name: "Ophthalmology",
        location: "Building C, Floor 1",
        description: "Cataract, glaucoma, vision checks",
    },
    Department {
        name: "Geriatrics",
        location: "Building C, Floor 2",
        description: "Comprehensive care for older adults",
    },
    Department {
        name: "Pharmacy",
        location: "Building A, Floor 1",
        description: "Prescription pickup and medication advice",
    },
];

const EMERGENCY_CONTACTS: &[EmergencyContact] = &[
    EmergencyContact {
        name: "Ambulance",
        phone: "120",
        description: "Medical emergencies",
    },
    EmergencyContact {
        name: "Police",
        phone: "110",
        description: "Danger to life or property",
    },
    EmergencyContact {
        name: "Fire",
        phone: "119",
        description: "Fire and rescue",
    },
    EmergencyContact {
        name: "Hospital Emergency Desk",
        phone: "010-6500-0120",
        description: "Emergency department, open 24 hours",
    },
];

/// All departments.
#[must_use]
pub fn departments() -> &'static [Department] {
    DEPARTMENTS
}

/// All emergency contacts.
#[must_use]
pub fn emergency_contacts() -> &'static [EmergencyContact] {
    EMERGENCY_CONTACTS
}

/// Route planner link to a department.
#[must_use]
pub fn route_planner_path(department: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(department.as_bytes()).collect();
    format!("/route-planner?to={encoded}")
}

/// Result page for a recognition.
#[must_use]
pub fn recognition_result_path(id: &str) -> String {
    format!("/medication-recognition/result/{id}")
}

/// A saved route.
#[must_use]
pub fn my_route_path(id: &str) -> String {
    format!("/my-routes/{id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::filter_by_name_substring;
    use crate::zone::{classify_zone, Zone};

    #[test]
    fn test_directory_not_empty() {
        assert!(!departments().is_empty());
        assert!(!emergency_contacts().is_empty());
    }

    #[test]
    fn test_filter_departments() {
        let found = filter_by_name_substring(departments(), "logy");
        let names: Vec<_> = found.iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec!["Cardiology", "Endocrinology", "Neurology", "Ophthalmology"]
        );
    }

    #[test]
    fn test_filter_contacts() {
        let found = filter_by_name_substring(emergency_contacts(), "hospital");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].phone, "010-6500-0120");
    }

    #[test]
    fn test_route_planner_path_encodes() {
        assert_eq!(route_planner_path("Cardiology"), "/route-planner?to=Cardiology");
        assert_eq!(
            route_planner_path("Eye & Ear"),
            "/route-planner?to=Eye+%26+Ear"
        );
    }

    #[test]
    fn test_links_classify_into_expected_zones() {
        assert_eq!(classify_zone(&route_planner_path("Geriatrics"), None), Zone::Medical);
        assert_eq!(classify_zone(&recognition_result_path("rec-1"), None), Zone::Family);
        assert_eq!(classify_zone(&my_route_path("3"), None), Zone::Elder);
    }
}
