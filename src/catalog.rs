//! Service & doctor directory, plus the services-page filter and search.
//!
//! The directory is compiled in; there is no remote catalog.

use serde::Serialize;

use crate::models::ServiceCategory;

// ═══════════════════════════════════════════
// Types
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Doctor {
    pub id: &'static str,
    pub name: &'static str,
    pub specialty: &'static str,
    pub rating: f32,
    pub experience_years: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ServiceContact {
    pub phone: &'static str,
    pub email: &'static str,
    pub department: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Service {
    pub id: &'static str,
    pub title: &'static str,
    pub category: ServiceCategory,
    pub description: &'static str,
    pub full_description: &'static str,
    pub features: &'static [&'static str],
    pub tags: &'static [&'static str],
    pub availability: &'static str,
    pub rating: f32,
    pub doctor_count: u16,
    pub procedures: &'static str,
    pub wait_time: &'static str,
    pub emergency_available: bool,
    pub contact: ServiceContact,
    /// Doctors bookable through the wizard.
    pub doctors: &'static [Doctor],
}

impl Service {
    pub fn doctor(&self, doctor_id: &str) -> Option<&'static Doctor> {
        self.doctors.iter().find(|d| d.id == doctor_id)
    }

    fn matches(&self, needle: &str) -> bool {
        let haystacks = [self.title, self.description, self.full_description]
            .into_iter()
            .chain(self.features.iter().copied())
            .chain(self.tags.iter().copied());
        for text in haystacks {
            if text.to_lowercase().contains(needle) {
                return true;
            }
        }
        false
    }
}

/// Category filter on the services page. `All` disables filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Only(ServiceCategory),
}

impl CategoryFilter {
    /// `"all"` or a category id; anything unrecognized means `All`.
    pub fn parse(raw: &str) -> Self {
        raw.parse::<ServiceCategory>()
            .map(Self::Only)
            .unwrap_or(Self::All)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(c) => c.as_str(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All Services",
            Self::Only(c) => c.label(),
        }
    }
}

// ═══════════════════════════════════════════
// Directory data
// ═══════════════════════════════════════════

pub static SERVICES: &[Service] = &[
    Service {
        id: "cardiology",
        title: "Cardiology",
        category: ServiceCategory::Specialty,
        description: "Comprehensive heart care with advanced cardiac procedures and treatments.",
        full_description: "Our Cardiology department offers state-of-the-art cardiac care with a team of experienced cardiologists and cardiac surgeons, from diagnostics through interventional and surgical treatment.",
        features: &[
            "Cardiac Catheterization",
            "Echocardiography",
            "Stress Testing",
            "Pacemaker Implantation",
            "Heart Surgery",
            "24/7 Emergency Care",
        ],
        tags: &["heart", "cardiac", "surgery", "emergency"],
        availability: "24/7 Available",
        rating: 4.9,
        doctor_count: 12,
        procedures: "500+ Monthly",
        wait_time: "15 minutes",
        emergency_available: true,
        contact: ServiceContact {
            phone: "+1 (234) 567-8901",
            email: "cardiology@lightspeed-hospital.com",
            department: "Cardiology Department - Floor 3",
        },
        doctors: &[
            Doctor { id: "dr-smith", name: "Dr. Sarah Smith", specialty: "Interventional Cardiology", rating: 4.9, experience_years: 15 },
            Doctor { id: "dr-johnson", name: "Dr. Michael Johnson", specialty: "Cardiac Surgery", rating: 4.8, experience_years: 20 },
            Doctor { id: "dr-williams", name: "Dr. Emily Williams", specialty: "Pediatric Cardiology", rating: 4.9, experience_years: 12 },
        ],
    },
    Service {
        id: "emergency",
        title: "Emergency Care",
        category: ServiceCategory::Emergency,
        description: "24/7 emergency medical services with rapid response trauma care.",
        full_description: "Our Emergency Department provides round-the-clock care with emergency physicians, nurses and support staff equipped for everything from minor injuries to life-threatening conditions.",
        features: &[
            "Trauma Center Level II",
            "Rapid Response Team",
            "Advanced Life Support",
            "Pediatric Emergency Care",
            "Stroke Center",
            "Chest Pain Center",
        ],
        tags: &["emergency", "trauma", "24/7", "urgent"],
        availability: "24/7 Emergency",
        rating: 4.8,
        doctor_count: 25,
        procedures: "1000+ Monthly",
        wait_time: "Immediate",
        emergency_available: true,
        contact: ServiceContact {
            phone: "+1 (234) 567-911",
            email: "emergency@lightspeed-hospital.com",
            department: "Emergency Department - Ground Floor",
        },
        doctors: &[
            Doctor { id: "dr-brown", name: "Dr. James Brown", specialty: "Emergency Medicine", rating: 4.7, experience_years: 18 },
            Doctor { id: "dr-davis", name: "Dr. Lisa Davis", specialty: "Trauma Surgery", rating: 4.8, experience_years: 14 },
        ],
    },
    Service {
        id: "pediatrics",
        title: "Pediatrics",
        category: ServiceCategory::Specialty,
        description: "Specialized healthcare services for infants, children, and adolescents.",
        full_description: "Our Pediatrics department cares for children from birth through adolescence, with pediatricians trained for the needs of growing children in a child-friendly environment.",
        features: &[
            "Well-Child Checkups",
            "Immunizations",
            "Developmental Screening",
            "Pediatric Surgery",
            "NICU Services",
            "Child Psychology",
        ],
        tags: &["children", "pediatric", "babies", "adolescents"],
        availability: "Mon-Fri 8AM-6PM",
        rating: 4.9,
        doctor_count: 15,
        procedures: "800+ Monthly",
        wait_time: "20 minutes",
        emergency_available: false,
        contact: ServiceContact {
            phone: "+1 (234) 567-8902",
            email: "pediatrics@lightspeed-hospital.com",
            department: "Pediatrics Department - Floor 2",
        },
        doctors: &[
            Doctor { id: "dr-wilson", name: "Dr. Amanda Wilson", specialty: "General Pediatrics", rating: 4.9, experience_years: 16 },
            Doctor { id: "dr-taylor", name: "Dr. Robert Taylor", specialty: "Pediatric Surgery", rating: 4.8, experience_years: 22 },
        ],
    },
    Service {
        id: "orthopedics",
        title: "Orthopedics",
        category: ServiceCategory::Surgical,
        description: "Advanced bone, joint, and musculoskeletal treatments and surgeries.",
        full_description: "Our Orthopedics department diagnoses, treats and prevents disorders of the bones, joints, ligaments, tendons and muscles, with surgical and non-surgical options.",
        features: &[
            "Joint Replacement Surgery",
            "Sports Medicine",
            "Spine Surgery",
            "Fracture Care",
            "Arthroscopic Surgery",
            "Physical Therapy",
        ],
        tags: &["bones", "joints", "surgery", "sports"],
        availability: "Mon-Sat 7AM-7PM",
        rating: 4.7,
        doctor_count: 18,
        procedures: "600+ Monthly",
        wait_time: "25 minutes",
        emergency_available: true,
        contact: ServiceContact {
            phone: "+1 (234) 567-8903",
            email: "orthopedics@lightspeed-hospital.com",
            department: "Orthopedics Department - Floor 4",
        },
        doctors: &[
            Doctor { id: "dr-anderson", name: "Dr. David Anderson", specialty: "Joint Replacement", rating: 4.8, experience_years: 19 },
            Doctor { id: "dr-thomas", name: "Dr. Jennifer Thomas", specialty: "Sports Medicine", rating: 4.9, experience_years: 13 },
        ],
    },
    Service {
        id: "neurology",
        title: "Neurology",
        category: ServiceCategory::Specialty,
        description: "Comprehensive brain and nervous system care with advanced treatments.",
        full_description: "Our Neurology department treats disorders of the brain, spinal cord and nervous system using current diagnostic techniques and treatment methods.",
        features: &[
            "Stroke Treatment",
            "Epilepsy Care",
            "Movement Disorders",
            "Memory Disorders",
            "Headache Treatment",
            "Neurosurgery",
        ],
        tags: &["brain", "neurology", "stroke", "epilepsy"],
        availability: "Mon-Fri 8AM-5PM",
        rating: 4.8,
        doctor_count: 10,
        procedures: "400+ Monthly",
        wait_time: "30 minutes",
        emergency_available: true,
        contact: ServiceContact {
            phone: "+1 (234) 567-8904",
            email: "neurology@lightspeed-hospital.com",
            department: "Neurology Department - Floor 5",
        },
        doctors: &[
            Doctor { id: "dr-martinez", name: "Dr. Carlos Martinez", specialty: "Stroke Specialist", rating: 4.9, experience_years: 17 },
            Doctor { id: "dr-garcia", name: "Dr. Maria Garcia", specialty: "Epilepsy Specialist", rating: 4.8, experience_years: 14 },
        ],
    },
    Service {
        id: "radiology",
        title: "Radiology & Imaging",
        category: ServiceCategory::Diagnostic,
        description: "Advanced medical imaging and diagnostic radiology services.",
        full_description: "Our Radiology department offers diagnostic imaging on current equipment, giving your care team accurate findings to plan treatment.",
        features: &[
            "MRI Scanning",
            "CT Imaging",
            "Ultrasound",
            "X-Ray Services",
            "Mammography",
            "Nuclear Medicine",
        ],
        tags: &["imaging", "xray", "mri", "ct scan"],
        availability: "Mon-Sun 6AM-10PM",
        rating: 4.6,
        doctor_count: 8,
        procedures: "1200+ Monthly",
        wait_time: "10 minutes",
        emergency_available: true,
        contact: ServiceContact {
            phone: "+1 (234) 567-8905",
            email: "radiology@lightspeed-hospital.com",
            department: "Radiology Department - Basement Level",
        },
        doctors: &[
            Doctor { id: "dr-lee", name: "Dr. Kevin Lee", specialty: "Diagnostic Radiology", rating: 4.7, experience_years: 16 },
            Doctor { id: "dr-white", name: "Dr. Susan White", specialty: "Interventional Radiology", rating: 4.8, experience_years: 18 },
        ],
    },
];

// ═══════════════════════════════════════════
// Lookup, filter, search
// ═══════════════════════════════════════════

pub fn find_service(id: &str) -> Option<&'static Service> {
    SERVICES.iter().find(|s| s.id == id)
}

/// Doctor lookup scoped to a service.
pub fn find_doctor(service_id: &str, doctor_id: &str) -> Option<&'static Doctor> {
    find_service(service_id)?.doctor(doctor_id)
}

pub fn filter_by_category(filter: CategoryFilter) -> Vec<&'static Service> {
    SERVICES
        .iter()
        .filter(|s| match filter {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => s.category == c,
        })
        .collect()
}

/// Case-insensitive substring search. An empty term matches everything.
pub fn search(term: &str) -> Vec<&'static Service> {
    let needle = term.trim().to_lowercase();
    SERVICES
        .iter()
        .filter(|s| needle.is_empty() || s.matches(&needle))
        .collect()
}

/// Filter and search combined, as the services page applies them.
pub fn browse(filter: CategoryFilter, term: &str) -> Vec<&'static Service> {
    let needle = term.trim().to_lowercase();
    filter_by_category(filter)
        .into_iter()
        .filter(|s| needle.is_empty() || s.matches(&needle))
        .collect()
}

// ═══════════════════════════════════════════
// Appointments-page link
// ═══════════════════════════════════════════

/// Query string the services page hands to the appointments page.
pub fn booking_link(service_id: &str) -> Option<String> {
    let service = find_service(service_id)?;
    Some(format!(
        "?service={}&category={}",
        service.id,
        service.category.as_str()
    ))
}

/// Wizard pre-selection parsed from the appointments-page query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preselection {
    /// Only set when the id names a known service.
    pub service: Option<String>,
    pub category: Option<String>,
}

/// Parse `service` and `category` from a `?a=b&c=d` query string.
pub fn parse_booking_query(query: &str) -> Preselection {
    let mut pre = Preselection::default();
    for pair in query.trim_start_matches('?').split('&') {
        let (key, value) = match pair.split_once('=') {
            Some(kv) => kv,
            None => continue,
        };
        if value.is_empty() {
            continue;
        }
        match key {
            "service" if find_service(value).is_some() => pre.service = Some(value.to_string()),
            "category" => pre.category = Some(value.to_string()),
            _ => {}
        }
    }
    pre
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_services_with_doctors() {
        assert_eq!(SERVICES.len(), 6);
        assert!(SERVICES.iter().all(|s| !s.doctors.is_empty()));
    }

    #[test]
    fn doctor_ids_are_unique() {
        let mut ids: Vec<&str> = SERVICES
            .iter()
            .flat_map(|s| s.doctors.iter().map(|d| d.id))
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn doctor_lookup_is_scoped_to_service() {
        assert_eq!(find_doctor("cardiology", "dr-smith").unwrap().name, "Dr. Sarah Smith");
        assert!(find_doctor("neurology", "dr-smith").is_none());
        assert!(find_doctor("dentistry", "dr-smith").is_none());
    }

    #[test]
    fn filter_all_returns_everything() {
        assert_eq!(filter_by_category(CategoryFilter::All).len(), SERVICES.len());
    }

    #[test]
    fn filter_by_specialty() {
        let ids: Vec<&str> = filter_by_category(CategoryFilter::Only(ServiceCategory::Specialty))
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["cardiology", "pediatrics", "neurology"]);
    }

    #[test]
    fn parse_filter_falls_back_to_all() {
        assert_eq!(CategoryFilter::parse("surgical"), CategoryFilter::Only(ServiceCategory::Surgical));
        assert_eq!(CategoryFilter::parse("all"), CategoryFilter::All);
        assert_eq!(CategoryFilter::parse("bogus"), CategoryFilter::All);
        assert_eq!(CategoryFilter::All.label(), "All Services");
    }

    #[test]
    fn search_matches_tags_and_features_case_insensitively() {
        let ids: Vec<&str> = search("MRI").iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["radiology"]);

        let ids: Vec<&str> = search("stroke").iter().map(|s| s.id).collect();
        assert!(ids.contains(&"neurology"));
        assert!(ids.contains(&"emergency"));
    }

    #[test]
    fn empty_search_matches_all() {
        assert_eq!(search("   ").len(), SERVICES.len());
    }

    #[test]
    fn search_without_hits_is_empty() {
        assert!(search("dermatology").is_empty());
    }

    #[test]
    fn browse_combines_filter_and_search() {
        let ids: Vec<&str> = browse(CategoryFilter::Only(ServiceCategory::Surgical), "surgery")
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["orthopedics"]);
    }

    #[test]
    fn booking_link_carries_category() {
        assert_eq!(
            booking_link("radiology").as_deref(),
            Some("?service=radiology&category=diagnostic")
        );
        assert!(booking_link("dentistry").is_none());
    }

    #[test]
    fn query_preselects_known_service() {
        let pre = parse_booking_query("?service=cardiology&category=specialty");
        assert_eq!(pre.service.as_deref(), Some("cardiology"));
        assert_eq!(pre.category.as_deref(), Some("specialty"));
    }

    #[test]
    fn query_ignores_unknown_service() {
        let pre = parse_booking_query("service=dentistry&utm=x&category");
        assert_eq!(pre, Preselection::default());
    }
}
