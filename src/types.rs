use serde::{Deserialize, Serialize};

// ── Person ───────────────────────────────────────────────────────────────

/// A stored person record. The demographic fields are filled once by the
/// enrichment pass at creation and change only through an explicit update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Person {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) surname: String,
    pub(crate) patronymic: String,
    pub(crate) gender: String,
    pub(crate) age: i64,
    pub(crate) nationality: String,
    pub(crate) created_at: i64,
}

// ── NewPerson ────────────────────────────────────────────────────────────

/// Everything the store needs to mint a record; `id` and `created_at` are
/// assigned at insert.
#[derive(Debug, Clone)]
pub(crate) struct NewPerson {
    pub(crate) name: String,
    pub(crate) surname: String,
    pub(crate) patronymic: String,
    pub(crate) profile: EnrichedProfile,
}

// ── EnrichedProfile ──────────────────────────────────────────────────────

/// Assembled output of the three classifiers. An empty string means the
/// service had no answer for that name; age 0 means unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub(crate) struct EnrichedProfile {
    pub(crate) age: i64,
    pub(crate) gender: String,
    pub(crate) nationality: String,
}

// ── PersonPatch ──────────────────────────────────────────────────────────

/// Sparse update: `None` leaves the stored value untouched. An empty string
/// never reaches this struct; the boundary treats it as absent, so a field
/// cannot be blanked through an update.
#[derive(Debug, Clone, Default)]
pub(crate) struct PersonPatch {
    pub(crate) name: Option<String>,
    pub(crate) surname: Option<String>,
    pub(crate) patronymic: Option<String>,
    pub(crate) gender: Option<String>,
    pub(crate) age: Option<i64>,
    pub(crate) nationality: Option<String>,
}

impl PersonPatch {
    pub(crate) fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.surname.is_none()
            && self.patronymic.is_none()
            && self.gender.is_none()
            && self.age.is_none()
            && self.nationality.is_none()
    }

    pub(crate) fn apply(&self, person: &mut Person) {
        if let Some(name) = &self.name {
            person.name = name.clone();
        }
        if let Some(surname) = &self.surname {
            person.surname = surname.clone();
        }
        if let Some(patronymic) = &self.patronymic {
            person.patronymic = patronymic.clone();
        }
        if let Some(gender) = &self.gender {
            person.gender = gender.clone();
        }
        if let Some(age) = self.age {
            person.age = age;
        }
        if let Some(nationality) = &self.nationality {
            person.nationality = nationality.clone();
        }
    }
}

// ── Classifier wire formats ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct AgeResponse {
    #[serde(default)]
    pub(crate) age: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenderResponse {
    #[serde(default)]
    pub(crate) gender: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NationalityResponse {
    #[serde(default)]
    pub(crate) country: Vec<CountryCandidate>,
}

/// One candidate in the service's confidence-ordered list. Extra fields
/// (probability, sample counts) are ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct CountryCandidate {
    pub(crate) country_id: String,
}

// ── Tests ────────────────────────────────────────────────────────────────
