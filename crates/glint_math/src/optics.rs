//! Mirror reflection and Snell refraction of unit directions.

use crate::Vec3;

/// Reflect `incident` about `normal`.
#[inline]
pub fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * normal.dot(incident) * normal
}

/// Refract `incident` through a surface with relative index `eta`
/// (n_incident / n_transmitted). `normal` must face the incident side.
///
/// Returns `None` on total internal reflection.
pub fn refract(incident: Vec3, normal: Vec3, eta: f32) -> Option<Vec3> {
    let cos_i = (-incident.dot(normal)).clamp(0.0, 1.0);
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k <= 0.0 {
        return None;
    }
    Some(eta * incident + (eta * cos_i - k.sqrt()) * normal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect_about_normal() {
        let d = Vec3::new(1.0, -1.0, 0.0).normalize();
        let r = reflect(d, Vec3::Y);
        assert!((r - Vec3::new(1.0, 1.0, 0.0).normalize()).length() < 1e-6);
    }

    #[test]
    fn test_refract_straight_through() {
        let t = refract(-Vec3::Y, Vec3::Y, 1.0 / 1.5).unwrap();
        assert!((t + Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_refract_obeys_snell() {
        let eta = 1.0 / 1.46;
        let d = Vec3::new(0.5, -(0.75f32).sqrt(), 0.0); // 30 degrees from the normal
        let t = refract(d, Vec3::Y, eta).unwrap();
        assert!((t.length() - 1.0).abs() < 1e-5);
        let sin_t = t.x;
        assert!((sin_t - eta * 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_refract_total_internal_reflection() {
        // Leaving glass at 60 degrees exceeds the ~43 degree critical angle
        let d = Vec3::new((0.75f32).sqrt(), -0.5, 0.0);
        assert!(refract(d, Vec3::Y, 1.46).is_none());
    }
}
