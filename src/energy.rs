//! Energy and momentum diagnostics.

/// `½ m v²`
pub fn kinetic(mass: f64, speed: f64) -> f64 {
    0.5 * mass * speed * speed
}

/// Bob speed of a pendulum segment, `|L ω|`.
pub fn bob_speed(length: f64, omega: f64) -> f64 {
    (length * omega).abs()
}

/// Height above the lowest point of a swing, `L (1 - cos θ)`.
pub fn pendulum_height(length: f64, theta: f64) -> f64 {
    length - length * theta.cos()
}

/// `m g L (1 - cos θ)`
pub fn pendulum_potential(mass: f64, g: f64, length: f64, theta: f64) -> f64 {
    mass * g * pendulum_height(length, theta)
}

/// `m g h`
pub fn gravitational_potential(mass: f64, g: f64, height: f64) -> f64 {
    mass * g * height
}

/// `½ k (length - rest)²`
pub fn spring_potential(stiffness: f64, length: f64, rest_length: f64) -> f64 {
    let stretch = length - rest_length;
    0.5 * stiffness * stretch * stretch
}

/// Signed total momentum of 1D bodies given as `(mass, velocity)` pairs.
pub fn momentum<I>(bodies: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    bodies.into_iter().map(|(m, v)| m * v).sum()
}

/// Total kinetic energy of 1D bodies given as `(mass, velocity)` pairs.
pub fn total_kinetic<I>(bodies: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    bodies.into_iter().map(|(m, v)| kinetic(m, v)).sum()
}

/// Mechanical energy lost since launch. Numerical drift can make the current
/// energy slightly exceed the initial one; that never shows as a gain.
pub fn energy_loss(initial: f64, kinetic: f64, potential: f64) -> f64 {
    (initial - (kinetic + potential)).max(0.0)
}

/// `|E - E₀| / |E₀|`, or the absolute error when `E₀` is zero.
pub fn relative_drift(baseline: f64, current: f64) -> f64 {
    if baseline.abs() > 1e-12 {
        (current - baseline).abs() / baseline.abs()
    } else {
        (current - baseline).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn horizontal_pendulum_sits_one_length_up() {
        assert_abs_diff_eq!(pendulum_height(10.0, FRAC_PI_2), 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pendulum_potential(2.0, 9.8, 10.0, FRAC_PI_2), 196.0, epsilon = 1e-9);
    }

    #[test]
    fn momentum_is_signed() {
        let p = momentum([(50.0, -3.0), (100.0, 1.5)]);
        assert_abs_diff_eq!(p, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(total_kinetic([(50.0, -3.0), (100.0, 1.5)]), 337.5, epsilon = 1e-9);
    }

    #[test]
    fn loss_never_negative() {
        assert_eq!(energy_loss(200.0, 150.0, 50.1), 0.0);
        assert_abs_diff_eq!(energy_loss(200.0, 100.0, 50.0), 50.0, epsilon = 1e-12);
    }

    #[test]
    fn spring_energy_is_symmetric_in_stretch() {
        assert_abs_diff_eq!(spring_potential(4.0, 7.0, 5.0), spring_potential(4.0, 3.0, 5.0));
        assert_abs_diff_eq!(spring_potential(4.0, 7.0, 5.0), 8.0, epsilon = 1e-12);
    }
}
