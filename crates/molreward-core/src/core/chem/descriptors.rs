//! Atom-contribution logP in the style of Wildman & Crippen (J. Chem. Inf. Comput.
//! Sci. 1999, 39, 868), using a reduced atom-type table.

use super::molecule::{
    BondOrder, Molecule, BROMINE, CARBON, CHLORINE, FLUORINE, HYDROGEN, IODINE, NITROGEN, OXYGEN,
    PHOSPHORUS, SULFUR,
};

const H_ON_CARBON: f64 = 0.1230;
const H_ON_NITROGEN: f64 = 0.2142;
const H_ALCOHOL: f64 = -0.2677;
const H_ACID: f64 = 0.2980;
const H_OTHER: f64 = 0.1125;

/// Estimated octanol/water partition coefficient.
pub fn crippen_logp(mol: &Molecule) -> f64 {
    (0..mol.num_atoms())
        .map(|idx| heavy_atom_contribution(mol, idx) + hydrogen_contribution(mol, idx))
        .sum()
}

fn heavy_atom_contribution(mol: &Molecule, idx: usize) -> f64 {
    let atom = mol.atom(idx);
    match atom.atomic_number {
        CARBON if atom.aromatic => aromatic_carbon(mol, idx),
        CARBON => aliphatic_carbon(mol, idx),
        NITROGEN => nitrogen(mol, idx),
        OXYGEN => oxygen(mol, idx),
        SULFUR if atom.aromatic => 0.6237,
        SULFUR if atom.charge != 0 => -0.0024,
        SULFUR => 0.6482,
        PHOSPHORUS => 0.8612,
        FLUORINE => 0.4202,
        CHLORINE => 0.6895,
        BROMINE => 0.8456,
        IODINE => 0.8857,
        HYDROGEN => H_OTHER,
        _ => 0.0,
    }
}

fn hydrogen_contribution(mol: &Molecule, idx: usize) -> f64 {
    let atom = mol.atom(idx);
    let per_hydrogen = match atom.atomic_number {
        CARBON => H_ON_CARBON,
        NITROGEN => H_ON_NITROGEN,
        OXYGEN if is_carboxylic_oxygen(mol, idx) => H_ACID,
        OXYGEN => H_ALCOHOL,
        _ => H_OTHER,
    };
    per_hydrogen * atom.total_hydrogens() as f64
}

fn is_heteroatom(atomic_number: u8) -> bool {
    !matches!(atomic_number, CARBON | HYDROGEN)
}

fn aliphatic_carbon(mol: &Molecule, idx: usize) -> f64 {
    let hydrogens = mol.atom(idx).total_hydrogens();
    let mut aromatic_neighbors = 0;
    let mut hetero_neighbors = 0;
    let mut double_to_carbon = false;
    let mut double_to_hetero = false;
    let mut triple = false;

    for (neighbor, bond) in mol.neighbors(idx) {
        let other = mol.atom(neighbor);
        if other.aromatic {
            aromatic_neighbors += 1;
        }
        let hetero = is_heteroatom(other.atomic_number);
        if hetero {
            hetero_neighbors += 1;
        }
        match bond.order {
            BondOrder::Double if hetero => double_to_hetero = true,
            BondOrder::Double => double_to_carbon = true,
            BondOrder::Triple => triple = true,
            _ => {}
        }
    }

    if triple {
        0.0017
    } else if double_to_hetero {
        -0.2783
    } else if double_to_carbon {
        0.1551
    } else if aromatic_neighbors > 0 {
        match hydrogens {
            3.. => 0.08452,
            2 => -0.0516,
            1 => 0.1193,
            _ => -0.0967,
        }
    } else if hetero_neighbors > 0 {
        if hydrogens >= 2 { -0.2035 } else { -0.2051 }
    } else if hydrogens >= 2 {
        0.1441
    } else {
        0.0
    }
}

fn aromatic_carbon(mol: &Molecule, idx: usize) -> f64 {
    if mol.atom(idx).total_hydrogens() > 0 {
        return 0.1581;
    }
    for (neighbor, bond) in mol.neighbors(idx) {
        if bond.order == BondOrder::Aromatic {
            continue;
        }
        let other = mol.atom(neighbor);
        if bond.order == BondOrder::Double {
            return -0.8186;
        }
        return match other.atomic_number {
            FLUORINE => 0.0,
            CHLORINE => 0.2450,
            BROMINE => 0.1980,
            IODINE => 0.0,
            NITROGEN => 0.4619,
            OXYGEN => 0.5437,
            SULFUR => 0.1893,
            CARBON if other.aromatic => 0.2713,
            CARBON => 0.1360,
            _ => -0.5443,
        };
    }
    0.2955
}

fn nitrogen(mol: &Molecule, idx: usize) -> f64 {
    let atom = mol.atom(idx);
    if atom.aromatic {
        return if atom.charge != 0 { -0.3239 } else { -0.4806 };
    }
    if atom.charge > 0 {
        return -0.3239;
    }
    let mut aromatic_neighbors = 0;
    for (neighbor, bond) in mol.neighbors(idx) {
        match bond.order {
            BondOrder::Triple => return -0.5290,
            BondOrder::Double => return -0.1185,
            _ => {}
        }
        if mol.atom(neighbor).aromatic {
            aromatic_neighbors += 1;
        }
    }
    match (atom.total_hydrogens(), aromatic_neighbors) {
        (2.., 0) => -1.0190,
        (2.., _) => -1.0270,
        (1, 0) => -0.7096,
        (1, 1) => -0.5188,
        (1, _) => 0.08387,
        (_, 0) => -0.3187,
        (_, 1) => -0.4458,
        _ => 0.01508,
    }
}

fn oxygen(mol: &Molecule, idx: usize) -> f64 {
    let atom = mol.atom(idx);
    if atom.aromatic {
        return 0.1552;
    }
    if atom.charge < 0 {
        return if is_carboxylic_oxygen(mol, idx) { -1.3260 } else { -0.3339 };
    }
    if atom.total_hydrogens() > 0 {
        return -0.2893;
    }
    if let Some((neighbor, _)) = mol
        .neighbors(idx)
        .find(|(_, bond)| bond.order == BondOrder::Double)
    {
        let other = mol.atom(neighbor);
        return match other.atomic_number {
            CARBON if other.aromatic => 0.1788,
            CARBON => -0.1526,
            _ => 0.0335,
        };
    }
    if mol.neighbors(idx).any(|(neighbor, _)| mol.atom(neighbor).aromatic) {
        -0.4195
    } else {
        -0.0684
    }
}

fn is_carboxylic_oxygen(mol: &Molecule, idx: usize) -> bool {
    mol.neighbors(idx).any(|(carbon, bond)| {
        bond.order == BondOrder::Single
            && mol.atom(carbon).atomic_number == CARBON
            && mol.neighbors(carbon).any(|(other, b)| {
                other != idx && b.order == BondOrder::Double && mol.atom(other).atomic_number == OXYGEN
            })
    })
}
