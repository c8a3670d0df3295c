use ndarray::Array2;
use rand::Rng;
use rand_distr::{Distribution, StandardUniform};

/// Draws a `shape` matrix of i.i.d. samples from the uniform distribution on `[0, 1)`
pub fn gen_uniform<R: Rng + ?Sized>(shape: (usize, usize), rng: &mut R) -> Array2<f32> {
    Array2::from_shape_fn(shape, |_| {
        let value: f32 = StandardUniform.sample(rng);
        value
    })
}

/// Samples a weight matrix uniformly in `[-0.5 * scale, 0.5 * scale)`
pub fn centered_uniform<R: Rng + ?Sized>(shape: (usize, usize), scale: f32, rng: &mut R) -> Array2<f32> {
    gen_uniform(shape, rng).mapv(|u| scale * u - 0.5 * scale)
}
