use crate::error::StructuralError;
use crate::math::{Point3, Vector3, TOLERANCE};

/// A bounding plane of a convex polyhedron.
///
/// The normal points outward and is stored normalised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolyhedronFace {
    origin: Point3,
    normal: Vector3,
}

impl PolyhedronFace {
    /// Creates a face from a point on the plane and an outward normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal is zero-length or not finite.
    pub fn new(origin: Point3, normal: Vector3) -> Result<Self, StructuralError> {
        let len = normal.norm();
        if !len.is_finite() || len < TOLERANCE {
            return Err(StructuralError::DegenerateFace(
                "face normal must be non-zero".into(),
            ));
        }
        Ok(Self {
            origin,
            normal: normal / len,
        })
    }

    /// Creates a face from `[x, y, z, nx, ny, nz]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal is zero-length.
    pub fn from_array(data: [f64; 6]) -> Result<Self, StructuralError> {
        Self::new(
            Point3::new(data[0], data[1], data[2]),
            Vector3::new(data[3], data[4], data[5]),
        )
    }

    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit outward normal.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Signed distance from the face plane, positive outside.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        (point.coords - self.origin.coords).dot(&self.normal)
    }
}

/// A convex region bounded by planar faces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyhedron {
    faces: Vec<PolyhedronFace>,
}

impl Polyhedron {
    #[must_use]
    pub fn new(faces: Vec<PolyhedronFace>) -> Self {
        Self { faces }
    }

    /// Creates an axis-aligned box from its center and half extents.
    ///
    /// # Errors
    ///
    /// Returns an error if any half extent is not strictly positive.
    pub fn cuboid(center: Point3, half_extents: Vector3) -> Result<Self, StructuralError> {
        if half_extents.iter().any(|h| !h.is_finite() || *h < TOLERANCE) {
            return Err(StructuralError::DegenerateFace(
                "box half extents must be positive".into(),
            ));
        }
        let mut faces = Vec::with_capacity(6);
        for axis in 0..3 {
            let mut normal = Vector3::zeros();
            normal[axis] = 1.0;
            let offset = normal * half_extents[axis];
            faces.push(PolyhedronFace::new(center + offset, normal)?);
            faces.push(PolyhedronFace::new(center - offset, -normal)?);
        }
        Ok(Self { faces })
    }

    #[must_use]
    pub fn faces(&self) -> &[PolyhedronFace] {
        &self.faces
    }

    /// Returns `true` if `point` lies inside or on the boundary.
    #[must_use]
    pub fn contains(&self, point: &Point3) -> bool {
        self.faces.iter().all(|f| f.signed_distance(point) <= 0.0)
    }
}

impl From<Vec<PolyhedronFace>> for Polyhedron {
    fn from(faces: Vec<PolyhedronFace>) -> Self {
        Self::new(faces)
    }
}
