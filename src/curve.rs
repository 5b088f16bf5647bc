//! Affine point arithmetic over short Weierstrass curves y² = x³ + ax + b (mod p)
//!
//! The engine is generic over [`Curve`] parameters; [`Curve::secp256k1`] is the single
//! process-wide instance used by keys, ECDSA and the codecs.

use std::sync::LazyLock;

use crate::constants::*;
use crate::error::CurveError;
use crate::field::U256;

/// Curve parameters: 𝒞 = (p, a, b, G, n)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Curve {
    p: U256,
    a: U256,
    b: U256,
    gx: U256,
    gy: U256,
    n: U256,
}

static SECP256K1: LazyLock<Curve> = LazyLock::new(|| Curve {
    p: SECP256K1_P,
    a: SECP256K1_A,
    b: SECP256K1_B,
    gx: SECP256K1_GX,
    gy: SECP256K1_GY,
    n: SECP256K1_N,
});

impl Curve {
    /// Build a curve, checking that the generator lies on it
    pub fn new(p: U256, a: U256, b: U256, gx: U256, gy: U256, n: U256) -> Result<Self, CurveError> {
        if !p.is_odd() || p <= U256::from_u64(3) {
            return Err(CurveError::InvalidParameters(
                "field prime must be an odd prime > 3".to_string(),
            ));
        }
        if a >= p || b >= p {
            return Err(CurveError::InvalidParameters(
                "coefficients must be reduced mod p".to_string(),
            ));
        }
        if n <= U256::ONE {
            return Err(CurveError::InvalidParameters("group order must exceed 1".to_string()));
        }
        let curve = Curve { p, a, b, gx, gy, n };
        if gx >= p || gy >= p {
            return Err(CurveError::CoordinateOutOfRange);
        }
        if !curve.contains(&gx, &gy) {
            return Err(CurveError::InvalidPoint);
        }
        Ok(curve)
    }

    /// The secp256k1 curve used by Bitcoin
    pub fn secp256k1() -> &'static Curve {
        &SECP256K1
    }

    pub fn field_prime(&self) -> &U256 {
        &self.p
    }

    pub fn a(&self) -> &U256 {
        &self.a
    }

    pub fn b(&self) -> &U256 {
        &self.b
    }

    pub fn order(&self) -> &U256 {
        &self.n
    }

    pub fn generator(&self) -> Point<'_> {
        Point {
            curve: self,
            coords: Some((self.gx, self.gy)),
        }
    }

    /// Right-hand side x³ + ax + b (mod p)
    fn rhs(&self, x: &U256) -> U256 {
        let p = &self.p;
        let x3 = x.square_mod(p).mul_mod(x, p);
        let ax = self.a.mul_mod(x, p);
        x3.add_mod(&ax, p).add_mod(&self.b, p)
    }

    fn contains(&self, x: &U256, y: &U256) -> bool {
        y.square_mod(&self.p) == self.rhs(x)
    }

    /// Recover the point with the given x and y parity.
    ///
    /// Square roots are taken as c^((p+1)/4), so p must be ≡ 3 (mod 4).
    pub fn lift_x(&self, x: &U256, y_is_odd: bool) -> Result<Point<'_>, CurveError> {
        if *x >= self.p {
            return Err(CurveError::CoordinateOutOfRange);
        }
        if self.p.limbs()[0] & 3 != 3 {
            return Err(CurveError::InvalidParameters(
                "square root requires p ≡ 3 mod 4".to_string(),
            ));
        }
        let c = self.rhs(x);
        let exp = self.p.wrapping_add(&U256::ONE).shr(2);
        let root = c.pow_mod(&exp, &self.p);
        if root.square_mod(&self.p) != c {
            return Err(CurveError::NoSquareRoot);
        }
        let y = if root.is_odd() == y_is_odd {
            root
        } else {
            root.neg_mod(&self.p)
        };
        if y.is_odd() != y_is_odd {
            // root was zero, no point with odd y
            return Err(CurveError::NoSquareRoot);
        }
        Ok(Point {
            curve: self,
            coords: Some((*x, y)),
        })
    }
}

/// Point: (x, y) ∈ 𝔽ₚ² on the curve, or the point at infinity 𝒪
#[derive(Debug, Clone, Copy)]
pub struct Point<'c> {
    curve: &'c Curve,
    coords: Option<(U256, U256)>,
}

impl PartialEq for Point<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.coords == other.coords && self.same_curve(other)
    }
}

impl Eq for Point<'_> {}

impl<'c> Point<'c> {
    /// Construct an affine point, validating field range and curve membership
    pub fn new(curve: &'c Curve, x: U256, y: U256) -> Result<Self, CurveError> {
        if x >= curve.p || y >= curve.p {
            return Err(CurveError::CoordinateOutOfRange);
        }
        if !curve.contains(&x, &y) {
            return Err(CurveError::InvalidPoint);
        }
        Ok(Point {
            curve,
            coords: Some((x, y)),
        })
    }

    pub fn infinity(curve: &'c Curve) -> Self {
        Point { curve, coords: None }
    }

    pub fn curve(&self) -> &'c Curve {
        self.curve
    }

    pub fn is_infinity(&self) -> bool {
        self.coords.is_none()
    }

    pub fn x(&self) -> Option<&U256> {
        self.coords.as_ref().map(|(x, _)| x)
    }

    pub fn y(&self) -> Option<&U256> {
        self.coords.as_ref().map(|(_, y)| y)
    }

    pub fn coordinates(&self) -> Option<(U256, U256)> {
        self.coords
    }

    /// IsOnCurve: 𝒪 is always valid, otherwise y² ≡ x³ + ax + b (mod p)
    pub fn is_on_curve(&self) -> bool {
        match &self.coords {
            None => true,
            Some((x, y)) => *x < self.curve.p && *y < self.curve.p && self.curve.contains(x, y),
        }
    }

    fn same_curve(&self, other: &Point<'_>) -> bool {
        std::ptr::eq(self.curve, other.curve) || self.curve == other.curve
    }

    pub fn negate(&self) -> Self {
        Point {
            curve: self.curve,
            coords: self.coords.map(|(x, y)| (x, y.neg_mod(&self.curve.p))),
        }
    }

    /// Add: P + Q
    ///
    /// 1. P = 𝒪 → Q, Q = 𝒪 → P
    /// 2. x₁ = x₂ ∧ y₁ ≠ y₂ → 𝒪
    /// 3. P = Q → Double(P)
    /// 4. s = (y₂ - y₁)/(x₂ - x₁), x₃ = s² - x₁ - x₂, y₃ = s(x₁ - x₃) - y₁
    pub fn add(&self, other: &Point<'c>) -> Result<Point<'c>, CurveError> {
        if !self.same_curve(other) {
            return Err(CurveError::CurveMismatch);
        }
        let (x1, y1) = match self.coords {
            None => return Ok(*other),
            Some(c) => c,
        };
        let (x2, y2) = match other.coords {
            None => return Ok(*self),
            Some(c) => c,
        };

        let p = &self.curve.p;
        if x1 == x2 {
            if y1 != y2 {
                return Ok(Point::infinity(self.curve));
            }
            return self.double();
        }

        let num = y2.sub_mod(&y1, p);
        let den = x2.sub_mod(&x1, p);
        let inv = den.inv_mod(p).ok_or(CurveError::DegenerateInverse)?;
        let s = num.mul_mod(&inv, p);

        let x3 = s.square_mod(p).sub_mod(&x1, p).sub_mod(&x2, p);
        let y3 = s.mul_mod(&x1.sub_mod(&x3, p), p).sub_mod(&y1, p);
        Ok(Point {
            curve: self.curve,
            coords: Some((x3, y3)),
        })
    }

    /// Double: 2P with s = (3x² + a)/(2y)
    pub fn double(&self) -> Result<Point<'c>, CurveError> {
        let (x1, y1) = match self.coords {
            None => return Ok(*self),
            Some(c) => c,
        };
        if y1.is_zero() {
            return Ok(Point::infinity(self.curve));
        }

        let p = &self.curve.p;
        let x_sq = x1.square_mod(p);
        let num = x_sq.add_mod(&x_sq, p).add_mod(&x_sq, p).add_mod(&self.curve.a, p);
        let den = y1.add_mod(&y1, p);
        let inv = den.inv_mod(p).ok_or(CurveError::DegenerateInverse)?;
        let s = num.mul_mod(&inv, p);

        let x3 = s.square_mod(p).sub_mod(&x1, p).sub_mod(&x1, p);
        let y3 = s.mul_mod(&x1.sub_mod(&x3, p), p).sub_mod(&y1, p);
        Ok(Point {
            curve: self.curve,
            coords: Some((x3, y3)),
        })
    }

    /// ScalarMult: k·P by binary double-and-add from the most significant bit
    pub fn scalar_mul(&self, k: &U256) -> Result<Point<'c>, CurveError> {
        if k.is_zero() {
            return Ok(Point::infinity(self.curve));
        }
        if *k == U256::ONE {
            return Ok(*self);
        }

        let mut acc = Point::infinity(self.curve);
        for i in (0..k.bits()).rev() {
            acc = acc.double()?;
            if k.bit(i) {
                acc = acc.add(self)?;
            }
        }
        Ok(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// y² = x³ + 7 over 𝔽₂₂₃, generator (47, 71) of order 21
    fn toy_curve() -> Curve {
        Curve::new(
            U256::from_u64(223),
            U256::ZERO,
            U256::from_u64(7),
            U256::from_u64(47),
            U256::from_u64(71),
            U256::from_u64(21),
        )
        .unwrap()
    }

    fn pt(curve: &Curve, x: u64, y: u64) -> Point<'_> {
        Point::new(curve, U256::from_u64(x), U256::from_u64(y)).unwrap()
    }

    #[test]
    fn test_point_construction() {
        let curve = toy_curve();
        assert!(Point::new(&curve, U256::from_u64(192), U256::from_u64(105)).is_ok());
        assert_eq!(
            Point::new(&curve, U256::from_u64(200), U256::from_u64(119)),
            Err(CurveError::InvalidPoint)
        );
        assert_eq!(
            Point::new(&curve, U256::from_u64(223), U256::from_u64(0)),
            Err(CurveError::CoordinateOutOfRange)
        );
    }

    #[test]
    fn test_toy_addition() {
        let curve = toy_curve();
        let sum = pt(&curve, 170, 142).add(&pt(&curve, 60, 139)).unwrap();
        assert_eq!(sum, pt(&curve, 220, 181));
        let sum = pt(&curve, 47, 71).add(&pt(&curve, 17, 56)).unwrap();
        assert_eq!(sum, pt(&curve, 215, 68));
        let sum = pt(&curve, 143, 98).add(&pt(&curve, 76, 66)).unwrap();
        assert_eq!(sum, pt(&curve, 47, 71));
    }

    #[test]
    fn test_toy_scalar_multiplication() {
        let curve = toy_curve();
        let g = curve.generator();
        assert_eq!(g.scalar_mul(&U256::from_u64(2)).unwrap(), pt(&curve, 36, 111));
        assert_eq!(g.scalar_mul(&U256::from_u64(4)).unwrap(), pt(&curve, 194, 51));
        assert_eq!(g.scalar_mul(&U256::from_u64(8)).unwrap(), pt(&curve, 116, 55));
        assert!(g.scalar_mul(&U256::from_u64(21)).unwrap().is_infinity());
    }

    #[test]
    fn test_identity_and_inverse() {
        let curve = toy_curve();
        let p = pt(&curve, 47, 71);
        let inf = Point::infinity(&curve);
        assert_eq!(p.add(&inf).unwrap(), p);
        assert_eq!(inf.add(&p).unwrap(), p);
        assert!(p.add(&p.negate()).unwrap().is_infinity());
        assert!(inf.double().unwrap().is_infinity());
        assert!(inf.is_on_curve());
    }

    #[test]
    fn test_add_equal_points_doubles() {
        let curve = toy_curve();
        let p = pt(&curve, 47, 71);
        assert_eq!(p.add(&p).unwrap(), p.double().unwrap());
    }

    #[test]
    fn test_curve_mismatch() {
        let toy = toy_curve();
        let p = pt(&toy, 47, 71);
        let g = Curve::secp256k1().generator();
        assert_eq!(p.add(&g), Err(CurveError::CurveMismatch));
    }

    #[test]
    fn test_invalid_curve_parameters() {
        let result = Curve::new(
            U256::from_u64(223),
            U256::ZERO,
            U256::from_u64(7),
            U256::from_u64(1),
            U256::from_u64(1),
            U256::from_u64(21),
        );
        assert_eq!(result, Err(CurveError::InvalidPoint));
        let even = Curve::new(
            U256::from_u64(224),
            U256::ZERO,
            U256::from_u64(7),
            U256::from_u64(47),
            U256::from_u64(71),
            U256::from_u64(21),
        );
        assert!(matches!(even, Err(CurveError::InvalidParameters(_))));
    }

    #[test]
    fn test_secp256k1_generator() {
        let curve = Curve::secp256k1();
        let g = curve.generator();
        assert!(g.is_on_curve());
        assert_eq!(g.scalar_mul(&U256::ONE).unwrap(), g);
        assert!(g.scalar_mul(&U256::ZERO).unwrap().is_infinity());
    }

    #[test]
    fn test_secp256k1_order_annihilates_generator() {
        let curve = Curve::secp256k1();
        let g = curve.generator();
        assert!(g.scalar_mul(curve.order()).unwrap().is_infinity());
    }

    #[test]
    fn test_secp256k1_double_generator() {
        let curve = Curve::secp256k1();
        let g2 = curve.generator().double().unwrap();
        assert_eq!(
            g2.x().unwrap().to_hex(),
            "c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5"
        );
        assert_eq!(
            g2.y().unwrap().to_hex(),
            "1ae168fea63dc339a3c58419466ceaeef7f632653266d0e1236431a950cfe52a"
        );
    }

    #[test]
    fn test_lift_x() {
        let curve = Curve::secp256k1();
        let g = curve.generator();
        let gy_odd = g.y().unwrap().is_odd();
        let lifted = curve.lift_x(g.x().unwrap(), gy_odd).unwrap();
        assert_eq!(lifted, g);
        let other = curve.lift_x(g.x().unwrap(), !gy_odd).unwrap();
        assert_eq!(other, g.negate());
    }

    #[test]
    fn test_lift_x_not_on_curve() {
        let curve = Curve::secp256k1();
        let x = U256::from_hex("eefdea4cdb677750a420fee807eacf21eb9898ae79b9768766e4faa04a2d4a34")
            .unwrap();
        assert_eq!(curve.lift_x(&x, false), Err(CurveError::NoSquareRoot));
        assert_eq!(curve.lift_x(curve.field_prime(), false), Err(CurveError::CoordinateOutOfRange));
    }
}
