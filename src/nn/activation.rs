use std::{collections::HashMap, fmt, str::FromStr};

use lazy_static::lazy_static;
use log::debug;
use ndarray::Array2;
use num_traits::Float;

use super::error::LossError;

// All derivatives take the pre-activation value, not the activation output.

pub fn identity<T>(z: T) -> T
where
    T: Float + From<f64>,
{
    z
}

pub fn d_identity<T>(_z: T) -> T
where
    T: Float + From<f64>,
{
    T::one()
}

pub fn sigmoid<T>(z: T) -> T
where
    T: Float + From<f64>,
{
    let exp_neg_z = (-z).exp();
    T::one() / (T::one() + exp_neg_z)
}

pub fn d_sigmoid<T>(z: T) -> T
where
    T: Float + From<f64>,
{
    let a = sigmoid(z);
    a * (T::one() - a)
}

pub fn hard_sigmoid<T>(z: T) -> T
where
    T: Float + From<f64>,
{
    let slope: T = 0.2.into();
    let offset: T = 0.5.into();
    (slope * z + offset).max(T::zero()).min(T::one())
}

pub fn d_hard_sigmoid<T>(z: T) -> T
where
    T: Float + From<f64>,
{
    let edge: T = 2.5.into();
    if z > -edge && z < edge {
        0.2.into()
    } else {
        T::zero()
    }
}

pub fn tanh<T>(z: T) -> T
where
    T: Float + From<f64>,
{
    z.tanh()
}

pub fn d_tanh<T>(z: T) -> T
where
    T: Float + From<f64>,
{
    T::one() - z.tanh().powf(2.0.into())
}

pub fn hard_tanh<T>(z: T) -> T
where
    T: Float + From<f64>,
{
    z.max(-T::one()).min(T::one())
}

pub fn d_hard_tanh<T>(z: T) -> T
where
    T: Float + From<f64>,
{
    if z > -T::one() && z < T::one() {
        T::one()
    } else {
        T::zero()
    }
}

pub fn relu<T>(z: T) -> T
where
    T: Float + From<f64>,
{
    z.max(T::zero())
}

pub fn d_relu<T>(z: T) -> T
where
    T: Float + From<f64>,
{
    if z > T::zero() {
        T::one()
    } else {
        T::zero()
    }
}

const LEAKY_RELU_ALPHA: f64 = 0.01;

pub fn leaky_relu<T>(z: T) -> T
where
    T: Float + From<f64>,
{
    let alpha: T = LEAKY_RELU_ALPHA.into();
    if z > T::zero() {
        z
    } else {
        alpha * z
    }
}

pub fn d_leaky_relu<T>(z: T) -> T
where
    T: Float + From<f64>,
{
    if z > T::zero() {
        T::one()
    } else {
        LEAKY_RELU_ALPHA.into()
    }
}

pub fn elu<T>(z: T) -> T
where
    T: Float + From<f64>,
{
    if z > T::zero() {
        z
    } else {
        z.exp() - T::one()
    }
}

pub fn d_elu<T>(z: T) -> T
where
    T: Float + From<f64>,
{
    if z > T::zero() {
        T::one()
    } else {
        z.exp()
    }
}

pub fn softplus<T>(z: T) -> T
where
    T: Float + From<f64>,
{
    z.exp().ln_1p()
}

pub fn d_softplus<T>(z: T) -> T
where
    T: Float + From<f64>,
{
    sigmoid(z)
}

pub fn softsign<T>(z: T) -> T
where
    T: Float + From<f64>,
{
    z / (T::one() + z.abs())
}

pub fn d_softsign<T>(z: T) -> T
where
    T: Float + From<f64>,
{
    let denom = T::one() + z.abs();
    T::one() / (denom * denom)
}

pub fn cube<T>(z: T) -> T
where
    T: Float + From<f64>,
{
    z.powi(3)
}

pub fn d_cube<T>(z: T) -> T
where
    T: Float + From<f64>,
{
    let three: T = 3.0.into();
    three * z * z
}

/// Row-wise softmax. Each row is shifted by its maximum before exponentiation.
pub fn softmax<T>(z: &Array2<T>) -> Array2<T>
where
    T: Float + From<f64>,
{
    let mut out = z.to_owned();
    for mut row in out.rows_mut() {
        let max = row.fold(T::neg_infinity(), |acc, &v| acc.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.fold(T::zero(), |acc, &v| acc + v);
        row.mapv_inplace(|v| v / sum);
    }
    out
}

/// Row-wise `ln(softmax(z))` computed as `z - max - ln(sum(exp(z - max)))`,
/// without ever forming the softmax itself.
pub fn log_softmax<T>(z: &Array2<T>) -> Array2<T>
where
    T: Float + From<f64>,
{
    let mut out = z.to_owned();
    for mut row in out.rows_mut() {
        let max = row.fold(T::neg_infinity(), |acc, &v| acc.max(v));
        let log_sum = row
            .fold(T::zero(), |acc, &v| acc + (v - max).exp())
            .ln();
        row.mapv_inplace(|v| v - max - log_sum);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivationTypes {
    Identity,
    Sigmoid,
    HardSigmoid,
    Tanh,
    HardTanh,
    Relu,
    LeakyRelu,
    Elu,
    Softplus,
    Softsign,
    Cube,
}

impl ActivationTypes {
    pub fn name(&self) -> &'static str {
        match self {
            ActivationTypes::Identity => "identity",
            ActivationTypes::Sigmoid => "sigmoid",
            ActivationTypes::HardSigmoid => "hardsigmoid",
            ActivationTypes::Tanh => "tanh",
            ActivationTypes::HardTanh => "hardtanh",
            ActivationTypes::Relu => "relu",
            ActivationTypes::LeakyRelu => "leakyrelu",
            ActivationTypes::Elu => "elu",
            ActivationTypes::Softplus => "softplus",
            ActivationTypes::Softsign => "softsign",
            ActivationTypes::Cube => "cube",
        }
    }

    pub const ALL: [ActivationTypes; 11] = [
        ActivationTypes::Identity,
        ActivationTypes::Sigmoid,
        ActivationTypes::HardSigmoid,
        ActivationTypes::Tanh,
        ActivationTypes::HardTanh,
        ActivationTypes::Relu,
        ActivationTypes::LeakyRelu,
        ActivationTypes::Elu,
        ActivationTypes::Softplus,
        ActivationTypes::Softsign,
        ActivationTypes::Cube,
    ];
}

impl<T> Activation<T> for ActivationTypes
where
    T: Float + From<f64>,
{
    fn call(&self, x: T) -> T {
        match self {
            ActivationTypes::Identity => identity::<T>(x),
            ActivationTypes::Sigmoid => sigmoid::<T>(x),
            ActivationTypes::HardSigmoid => hard_sigmoid::<T>(x),
            ActivationTypes::Tanh => tanh::<T>(x),
            ActivationTypes::HardTanh => hard_tanh::<T>(x),
            ActivationTypes::Relu => relu::<T>(x),
            ActivationTypes::LeakyRelu => leaky_relu::<T>(x),
            ActivationTypes::Elu => elu::<T>(x),
            ActivationTypes::Softplus => softplus::<T>(x),
            ActivationTypes::Softsign => softsign::<T>(x),
            ActivationTypes::Cube => cube::<T>(x),
        }
    }

    fn call_derivative(&self, x: T) -> T {
        match self {
            ActivationTypes::Identity => d_identity::<T>(x),
            ActivationTypes::Sigmoid => d_sigmoid::<T>(x),
            ActivationTypes::HardSigmoid => d_hard_sigmoid::<T>(x),
            ActivationTypes::Tanh => d_tanh::<T>(x),
            ActivationTypes::HardTanh => d_hard_tanh::<T>(x),
            ActivationTypes::Relu => d_relu::<T>(x),
            ActivationTypes::LeakyRelu => d_leaky_relu::<T>(x),
            ActivationTypes::Elu => d_elu::<T>(x),
            ActivationTypes::Softplus => d_softplus::<T>(x),
            ActivationTypes::Softsign => d_softsign::<T>(x),
            ActivationTypes::Cube => d_cube::<T>(x),
        }
    }
}

/// An element-wise transform with a pointwise derivative.
pub trait Activation<T: Float + From<f64>> {
    fn call(&self, x: T) -> T;
    fn call_derivative(&self, x: T) -> T;

    /// Applies the transform to a copy of `z`; `z` itself is left untouched.
    fn forward(&self, z: &Array2<T>) -> Array2<T> {
        z.mapv(|v| self.call(v))
    }

    fn derivative(&self, z: &Array2<T>) -> Array2<T> {
        z.mapv(|v| self.call_derivative(v))
    }
}

/// What an activation identifier resolves to.
///
/// `Softmax` is kept apart from the element-wise transforms: it normalizes a
/// whole row and therefore has no pointwise derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Softmax,
    Elementwise(ActivationTypes),
}

pub const SOFTMAX: &str = "softmax";

lazy_static! {
    static ref REGISTRY: HashMap<&'static str, Transform> = {
        let mut registry = HashMap::new();
        registry.insert(SOFTMAX, Transform::Softmax);
        for act in ActivationTypes::ALL {
            registry.insert(act.name(), Transform::Elementwise(act));
        }
        registry
    };
}

impl Transform {
    pub fn resolve(name: &str) -> Result<Self, LossError> {
        let transform = REGISTRY
            .get(name)
            .copied()
            .ok_or_else(|| LossError::UnknownActivation {
                name: name.to_string(),
            })?;
        debug!("resolved activation '{name}' to {transform:?}");
        Ok(transform)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transform::Softmax => SOFTMAX,
            Transform::Elementwise(act) => act.name(),
        }
    }

    /// Every identifier the registry knows, sorted.
    pub fn registered_names() -> Vec<&'static str> {
        let mut names: Vec<_> = REGISTRY.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn forward<T>(&self, z: &Array2<T>) -> Array2<T>
    where
        T: Float + From<f64>,
    {
        match self {
            Transform::Softmax => softmax(z),
            Transform::Elementwise(act) => act.forward(z),
        }
    }
}

impl FromStr for Transform {
    type Err = LossError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Transform::resolve(s)
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
