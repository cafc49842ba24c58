//! Element table for the organic-chemistry subset

/// A chemical element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    pub atomic_number: u8,
    pub symbol: &'static str,
    pub atomic_weight: f64,
    /// Allowed valences for atoms written without brackets, lowest first
    pub default_valences: &'static [u8],
}

const fn el(
    atomic_number: u8,
    symbol: &'static str,
    atomic_weight: f64,
    default_valences: &'static [u8],
) -> Element {
    Element {
        atomic_number,
        symbol,
        atomic_weight,
        default_valences,
    }
}

static ELEMENTS: &[Element] = &[
    el(1, "H", 1.008, &[1]),
    el(2, "He", 4.003, &[]),
    el(3, "Li", 6.941, &[]),
    el(4, "Be", 9.012, &[]),
    el(5, "B", 10.81, &[3]),
    el(6, "C", 12.011, &[4]),
    el(7, "N", 14.007, &[3, 5]),
    el(8, "O", 15.999, &[2]),
    el(9, "F", 18.998, &[1]),
    el(10, "Ne", 20.180, &[]),
    el(11, "Na", 22.990, &[]),
    el(12, "Mg", 24.305, &[]),
    el(13, "Al", 26.982, &[]),
    el(14, "Si", 28.086, &[]),
    el(15, "P", 30.974, &[3, 5]),
    el(16, "S", 32.065, &[2, 4, 6]),
    el(17, "Cl", 35.453, &[1]),
    el(18, "Ar", 39.948, &[]),
    el(19, "K", 39.098, &[]),
    el(20, "Ca", 40.078, &[]),
    el(25, "Mn", 54.938, &[]),
    el(26, "Fe", 55.845, &[]),
    el(27, "Co", 58.933, &[]),
    el(28, "Ni", 58.693, &[]),
    el(29, "Cu", 63.546, &[]),
    el(30, "Zn", 65.38, &[]),
    el(32, "Ge", 72.63, &[]),
    el(33, "As", 74.922, &[]),
    el(34, "Se", 78.96, &[]),
    el(35, "Br", 79.904, &[1]),
    el(37, "Rb", 85.468, &[]),
    el(38, "Sr", 87.62, &[]),
    el(47, "Ag", 107.868, &[]),
    el(48, "Cd", 112.414, &[]),
    el(50, "Sn", 118.710, &[]),
    el(51, "Sb", 121.760, &[]),
    el(52, "Te", 127.60, &[]),
    el(53, "I", 126.904, &[1]),
    el(55, "Cs", 132.905, &[]),
    el(56, "Ba", 137.327, &[]),
    el(78, "Pt", 195.084, &[]),
    el(79, "Au", 196.967, &[]),
    el(80, "Hg", 200.59, &[]),
    el(82, "Pb", 207.2, &[]),
];

/// Look up an element by its symbol (e.g. "C", "Cl")
pub fn element_by_symbol(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.symbol == symbol)
}

/// Look up an element by atomic number
pub fn element_by_number(n: u8) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.atomic_number == n)
}

/// Standard atomic weight, 0.0 for elements outside the table
pub fn atomic_weight(n: u8) -> f64 {
    element_by_number(n).map(|e| e.atomic_weight).unwrap_or(0.0)
}
