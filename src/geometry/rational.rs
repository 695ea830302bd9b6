//! Exact fractions for aspect ratios and time scales
//!
//! Every value is kept in lowest terms with a positive denominator, so plain
//! component equality is value equality. `{0, 0}` is the canonical zero and
//! also what any fraction with a zero part collapses to.
//!
//! Products are computed by cancelling each numerator against each
//! denominator before multiplying. If the cancelled product still does not
//! fit in `T`, the operation panics instead of wrapping.

use num_traits::PrimInt;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Div, Mul};

/// A reduced fraction over a primitive integer type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rational<T> {
    numerator: T,
    denominator: T,
}

fn gcd<T: PrimInt>(mut a: T, mut b: T) -> T {
    while !b.is_zero() {
        let temp = a % b;
        a = b;
        b = temp;
    }
    abs(a)
}

fn abs<T: PrimInt>(value: T) -> T {
    if value < T::zero() {
        negate(value)
    } else {
        value
    }
}

fn negate<T: PrimInt>(value: T) -> T {
    T::zero()
        .checked_sub(&value)
        .unwrap_or_else(|| overflow("negation"))
}

/// Divides both values by their gcd; both must be non-zero.
fn reduce<T: PrimInt>(num: &mut T, den: &mut T) {
    let divisor = gcd(*num, *den);
    *num = *num / divisor;
    *den = *den / divisor;
}

#[cold]
fn overflow(operation: &str) -> ! {
    log::error!("Rational overflow in {}", operation);
    panic!("rational overflow in {}", operation);
}

impl<T: PrimInt> Rational<T> {
    /// Create a reduced fraction `num / den`
    ///
    /// A zero numerator or denominator yields the canonical zero.
    pub fn new(num: T, den: T) -> Self {
        Self::from_product(num, T::one(), den, T::one())
    }

    /// The canonical zero, `{0, 0}`
    pub fn zero() -> Self {
        Self {
            numerator: T::zero(),
            denominator: T::zero(),
        }
    }

    /// Builds `(num1 * num2) / (den1 * den2)`, cancelling every numerator
    /// against every denominator before multiplying.
    fn from_product(mut num1: T, mut num2: T, mut den1: T, mut den2: T) -> Self {
        if num1.is_zero() || num2.is_zero() || den1.is_zero() || den2.is_zero() {
            return Self::zero();
        }

        reduce(&mut num1, &mut den1);
        reduce(&mut num1, &mut den2);
        reduce(&mut num2, &mut den1);
        reduce(&mut num2, &mut den2);

        let mut numerator = num1
            .checked_mul(&num2)
            .unwrap_or_else(|| overflow("numerator product"));
        let mut denominator = den1
            .checked_mul(&den2)
            .unwrap_or_else(|| overflow("denominator product"));

        if denominator < T::zero() {
            numerator = negate(numerator);
            denominator = negate(denominator);
        }

        debug_assert!(gcd(numerator, denominator) == T::one());
        Self {
            numerator,
            denominator,
        }
    }

    pub fn numerator(&self) -> T {
        self.numerator
    }

    pub fn denominator(&self) -> T {
        self.denominator
    }

    /// Whether both parts are non-zero
    pub fn is_valid(&self) -> bool {
        !self.numerator.is_zero() && !self.denominator.is_zero()
    }

    pub fn is_zero(&self) -> bool {
        !self.is_valid()
    }

    /// Integer quotient, rounded toward zero; zero for the canonical zero
    pub fn truncate(&self) -> T {
        if self.is_valid() {
            self.numerator / self.denominator
        } else {
            T::zero()
        }
    }

    /// Floating-point value; zero for the canonical zero
    pub fn as_f64(&self) -> f64 {
        if !self.is_valid() {
            return 0.0;
        }
        let num = self.numerator.to_f64().unwrap_or(0.0);
        let den = self.denominator.to_f64().unwrap_or(1.0);
        num / den
    }

    /// Swap numerator and denominator
    pub fn inverse(&self) -> Self {
        if self.denominator.is_zero() || self.numerator.is_zero() {
            return Self::zero();
        }
        if self.numerator < T::zero() {
            Self {
                numerator: negate(self.denominator),
                denominator: negate(self.numerator),
            }
        } else {
            Self {
                numerator: self.denominator,
                denominator: self.numerator,
            }
        }
    }

    fn sign(&self) -> Ordering {
        if self.is_valid() {
            self.numerator.cmp(&T::zero())
        } else {
            Ordering::Equal
        }
    }
}

/// Compares `a/b` with `c/d` for non-negative numerators and positive
/// denominators, one continued-fraction term at a time so nothing is
/// multiplied.
fn cmp_magnitude<T: PrimInt>(mut a: T, mut b: T, mut c: T, mut d: T) -> Ordering {
    loop {
        let (qa, ra) = (a / b, a % b);
        let (qc, rc) = (c / d, c % d);
        if qa != qc {
            return qa.cmp(&qc);
        }

        match (ra.is_zero(), rc.is_zero()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {
                // ra/b < rc/d exactly when d/rc < b/ra
                let (next_a, next_b, next_c, next_d) = (d, rc, b, ra);
                a = next_a;
                b = next_b;
                c = next_c;
                d = next_d;
            }
        }
    }
}

impl<T: PrimInt> Ord for Rational<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        let (lhs, rhs) = (self.sign(), other.sign());
        if lhs != rhs {
            return lhs.cmp(&rhs);
        }

        match lhs {
            Ordering::Equal => Ordering::Equal,
            Ordering::Greater => cmp_magnitude(
                self.numerator,
                self.denominator,
                other.numerator,
                other.denominator,
            ),
            Ordering::Less => cmp_magnitude(
                abs(other.numerator),
                other.denominator,
                abs(self.numerator),
                self.denominator,
            ),
        }
    }
}

impl<T: PrimInt> PartialOrd for Rational<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: PrimInt> Mul for Rational<T> {
    type Output = Rational<T>;

    fn mul(self, other: Rational<T>) -> Rational<T> {
        Rational::from_product(
            self.numerator,
            other.numerator,
            self.denominator,
            other.denominator,
        )
    }
}

impl<T: PrimInt> Mul<T> for Rational<T> {
    type Output = Rational<T>;

    fn mul(self, other: T) -> Rational<T> {
        Rational::from_product(self.numerator, other, self.denominator, T::one())
    }
}

impl<T: PrimInt> Div for Rational<T> {
    type Output = Rational<T>;

    fn div(self, other: Rational<T>) -> Rational<T> {
        Rational::from_product(
            self.numerator,
            other.denominator,
            self.denominator,
            other.numerator,
        )
    }
}

impl<T: PrimInt> Div<T> for Rational<T> {
    type Output = Rational<T>;

    fn div(self, other: T) -> Rational<T> {
        Rational::from_product(self.numerator, T::one(), self.denominator, other)
    }
}

macro_rules! scalar_ops {
    ($($t:ty),*) => {
        $(
            impl Mul<Rational<$t>> for $t {
                type Output = Rational<$t>;

                fn mul(self, other: Rational<$t>) -> Rational<$t> {
                    other * self
                }
            }

            impl Div<Rational<$t>> for $t {
                type Output = Rational<$t>;

                fn div(self, other: Rational<$t>) -> Rational<$t> {
                    other.inverse() * self
                }
            }
        )*
    };
}

scalar_ops!(u32, u64, i32, i64, usize);

impl<T: fmt::Display> fmt::Display for Rational<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
