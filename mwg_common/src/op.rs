//! Operator-lifting macros for transparent numeric newtypes.
//!
//! `op!` forwards the standard arithmetic traits to the wrapped integer so that newtypes such as
//! [`crate::Money`] behave like plain numbers without hand-writing each impl.

#[macro_export]
macro_rules! op {
    (binary $t:ty, $op:ident, $f:ident) => {
        impl std::ops::$op for $t {
            type Output = Self;

            fn $f(self, rhs: Self) -> Self::Output {
                Self(std::ops::$op::$f(self.0, rhs.0))
            }
        }
    };
    (inplace $t:ty, $op:ident, $f:ident) => {
        impl std::ops::$op for $t {
            fn $f(&mut self, rhs: Self) {
                std::ops::$op::$f(&mut self.0, rhs.0)
            }
        }
    };
    (unary $t:ty, $op:ident, $f:ident) => {
        impl std::ops::$op for $t {
            type Output = Self;

            fn $f(self) -> Self::Output {
                Self(std::ops::$op::$f(self.0))
            }
        }
    };
}
