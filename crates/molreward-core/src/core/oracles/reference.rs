use phf::phf_map;

pub const DEFAULT_REFERENCE: &str = "Celebrex";

static REFERENCE_STRUCTURES: phf::Map<&'static str, &'static str> = phf_map! {
    "Celebrex" => "C1(S(N)(=O)=O)=CC=C(N2C(C3=CC=C(C)C=C3)=CC(C(F)(F)F)=N2)C=C1",
    "Osimertinib" => "CN1C=C(C2=CC=CC=C21)C3=NC(=NC=C3)NC4=C(C=C(C(=C4)NC(=O)C=C)N(C)CCN(C)C)OC",
    "Fexofenadine" => "CC(C)(C1=CC=C(C=C1)C(CCCN2CCC(CC2)C(C3=CC=CC=C3)(C4=CC=CC=C4)O)O)C(=O)O",
    "Ranolazine" => "CC1=C(C(=CC=C1)C)NC(=O)CN2CCN(CC2)CC(COC3=CC=CC=C3OC)O",
    "Perindopril" => "CCCC(C(=O)O)NC(C)C(=O)N1C2CCCCC2CC1C(=O)O",
    "Amlodipine" => "CCOC(=O)C1=C(NC(=C(C1C2=CC=CC=C2Cl)C(=O)OC)C)COCCN",
    "Sitagliptin" => "C1CN2C(=NN=C2C(F)(F)F)CN1C(=O)CC(CC3=CC(=C(C=C3F)F)F)N",
    "Zaleplon" => "CCN(C1=CC=CC(=C1)C2=CC=NC3=C(C=NN23)C#N)C(=O)C",
};

/// Returns the SMILES of a catalogued reference structure.
pub fn lookup(name: &str) -> Option<&'static str> {
    REFERENCE_STRUCTURES.get(name).copied()
}

/// Catalogued names, sorted.
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<_> = REFERENCE_STRUCTURES.keys().copied().collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::smiles;

    #[test]
    fn catalog_contains_eight_structures_including_default() {
        assert_eq!(names().len(), 8);
        assert!(lookup(DEFAULT_REFERENCE).is_some());
        assert!(lookup("Aspirin").is_none());
    }

    #[test]
    fn every_catalogued_structure_parses() {
        for name in names() {
            let smiles_str = lookup(name).unwrap();
            assert!(
                smiles::parse(smiles_str).is_ok(),
                "reference {} failed to parse",
                name
            );
        }
    }
}
