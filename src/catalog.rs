use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use serde::Serialize;

// ─── Reference data ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Professional {
    pub id: u32,
    pub name: &'static str,
    #[serde(skip)]
    pub specialty: Specialty,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Specialty {
    pub id: u32,
    pub name: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Unit {
    pub id: u32,
    pub name: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Room {
    pub id: u64,
    pub name: String,
}

const CARDIOLOGY: Specialty = Specialty {
    id: 1,
    name: "Cardiologia",
};
const DERMATOLOGY: Specialty = Specialty {
    id: 2,
    name: "Dermatologia",
};
const PEDIATRICS: Specialty = Specialty {
    id: 3,
    name: "Pediatria",
};
const ORTHOPEDICS: Specialty = Specialty {
    id: 4,
    name: "Ortopedia",
};
const GENERAL: Specialty = Specialty {
    id: 0,
    name: "Clínica Geral",
};

static PROFESSIONALS: &[Professional] = &[
    Professional {
        id: 2684,
        name: "Dr(a). Pat Duarte",
        specialty: CARDIOLOGY,
    },
    Professional {
        id: 512,
        name: "Dr. Ícaro Menezes",
        specialty: DERMATOLOGY,
    },
    Professional {
        id: 782,
        name: "Dr(a). Helena Faria",
        specialty: PEDIATRICS,
    },
    Professional {
        id: 903,
        name: "Dr. André Ribeiro",
        specialty: ORTHOPEDICS,
    },
];

static UNITS: &[Unit] = &[
    Unit {
        id: 901,
        name: "Clínica Central",
    },
    Unit {
        id: 905,
        name: "Unidade Bela Vista",
    },
    Unit {
        id: 910,
        name: "Centro Norte",
    },
    Unit {
        id: 915,
        name: "Hub Telemedicina",
    },
];

/// Half-hour slot starts, lunch break (12:00–13:59) excluded.
static SLOT_STARTS: &[&str] = &[
    "08:00", "08:30", "09:00", "09:30", "10:00", "10:30", "11:00", "11:30",
    "14:00", "14:30", "15:00", "15:30", "16:00", "16:30", "17:00", "17:30",
];

/// Share of slots that come back as bookable.
const AVAILABILITY: f64 = 0.7;

// ─── Lookups ─────────────────────────────────────────────────────

/// Known professional, or a generic placeholder keeping the requested id.
pub fn professional(id: u32) -> Professional {
    PROFESSIONALS
        .iter()
        .find(|p| p.id == id)
        .copied()
        .unwrap_or(Professional {
            id,
            name: "Profissional",
            specialty: GENERAL,
        })
}

pub fn unit(id: u32) -> Unit {
    UNITS
        .iter()
        .find(|u| u.id == id)
        .copied()
        .unwrap_or(Unit {
            id,
            name: "Unidade",
        })
}

/// Each professional has a fixed room per unit.
pub fn room(professional: &Professional, unit: &Unit) -> Room {
    let number = 100 + (professional.id as u64 + unit.id as u64) % 20;
    Room {
        id: unit.id as u64 * 1000 + number,
        name: format!("Sala {number}"),
    }
}

// ─── Slots ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Slot {
    pub start: &'static str,
    pub available: bool,
}

/// Slots for one day. Deterministic per (professional, unit, date) so
/// repeated queries agree with each other.
pub fn slots(professional_id: u32, unit_id: u32, date: NaiveDate) -> Vec<Slot> {
    let seed = ((professional_id as u64) << 40)
        ^ ((unit_id as u64) << 20)
        ^ (date.num_days_from_ce() as u64);
    let mut rng = StdRng::seed_from_u64(seed);

    // No weekend agenda
    let weekend = date.weekday().number_from_monday() >= 6;

    SLOT_STARTS
        .iter()
        .map(|&start| Slot {
            start,
            available: !weekend && rng.gen_bool(AVAILABILITY),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_professionals() {
        assert_eq!(professional(2684).name, "Dr(a). Pat Duarte");
        assert_eq!(professional(2684).specialty.name, "Cardiologia");

        let unknown = professional(1);
        assert_eq!(unknown.id, 1);
        assert_eq!(unknown.specialty.name, "Clínica Geral");
    }

    #[test]
    fn unknown_unit_keeps_id() {
        assert_eq!(unit(905).name, "Unidade Bela Vista");
        assert_eq!(unit(42).id, 42);
    }

    #[test]
    fn slots_are_deterministic() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 23).unwrap();
        let a: Vec<bool> = slots(2684, 901, date).iter().map(|s| s.available).collect();
        let b: Vec<bool> = slots(2684, 901, date).iter().map(|s| s.available).collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), SLOT_STARTS.len());
    }

    #[test]
    fn weekends_have_no_availability() {
        // 2025-12-27 is a Saturday
        let saturday = NaiveDate::from_ymd_opt(2025, 12, 27).unwrap();
        assert!(slots(2684, 901, saturday).iter().all(|s| !s.available));
    }
}
