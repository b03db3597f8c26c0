/// Trait for mapping a value from one scale to another (e.g. a percentage to a device unit).
pub trait Scalable {
    /// Maps `self` from `[from_low, from_high]` to `[to_low, to_high]`.
    ///
    /// Integer results are truncated toward zero, the way the hub firmware expects its integer
    /// arguments.
    fn scale(self, from_low: Self, from_high: Self, to_low: Self, to_high: Self) -> Self;
}

macro_rules! impl_scalable {
    ($($variant:ty),*) => {
        $(
            impl Scalable for $variant {
                fn scale(self, from_low: Self, from_high: Self, to_low: Self, to_high: Self) -> Self {
                    ((self as f64 - from_low as f64) * (to_high as f64 - to_low as f64)
                        / (from_high as f64 - from_low as f64)
                        + to_low as f64) as Self
                }
            }
        )*
    };
}

impl_scalable!(u16, i32, i64, f64);
