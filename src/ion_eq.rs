/// Ion data-model equivalence.
///
/// Some types' `PartialEq` implementations compare *numeric* value: `7.0` and `7.00` are `==`
/// even though their text representations differ. The Ion data model, however, distinguishes
/// them (their coefficients and exponents differ). `IonEq` captures the stricter comparison;
/// round-trip tests use it to confirm that re-encoding preserved a value exactly.
pub trait IonEq {
    fn ion_eq(&self, other: &Self) -> bool;
}

impl<T: IonEq> IonEq for Vec<T> {
    fn ion_eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().zip(other.iter()).all(|(a, b)| a.ion_eq(b))
    }
}
