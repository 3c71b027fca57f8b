use serde::{Deserialize, Serialize};

/// Row-major matrix of `f32`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Mat {
    pub data: Vec<f32>,
    pub shape: Vec<usize>,
}

impl Mat {
    /// A matrix filled with zeros.
    pub fn zeros(m: usize, n: usize) -> Self {
        Self {
            data: vec![0.0; m * n],
            shape: vec![m, n],
        }
    }

    /// A matrix with elements given by `f`.
    pub fn from_fn(m: usize, n: usize, mut f: impl FnMut() -> f32) -> Self {
        Self {
            data: (0..m * n).map(|_| f()).collect(),
            shape: vec![m, n],
        }
    }

    pub fn n_rows(&self) -> usize {
        self.shape[0]
    }

    pub fn n_cols(&self) -> usize {
        self.shape[1]
    }

    pub fn row(&self, i: usize) -> &[f32] {
        let n = self.n_cols();
        &self.data[i * n..(i + 1) * n]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f32] {
        let n = self.n_cols();
        &mut self.data[i * n..(i + 1) * n]
    }

    pub fn matmul(&self, x: &Mat) -> Self {
        let (m, l, n) = (self.shape[0], self.shape[1], x.shape[1]);
        assert_eq!(l, x.shape[0], "Invalid shapes: {:?}", (&self.shape, &x.shape));
        let mut data = vec![0.0f32; m * n];
        for i in 0..m {
            for j in 0..n {
                let kk = i * n + j;
                for k in 0..l {
                    data[kk] += self.data[i * l + k] * x.data[k * n + j];
                }
            }
        }

        Self {
            shape: vec![m, n],
            data,
        }
    }

    pub fn add(&self, x: &Mat) -> Self {
        if self.shape != x.shape {
            panic!(
                "Trying to add matrices of different sizes: {:?}",
                (&self.shape, &x.shape)
            );
        }

        let data = self
            .data
            .iter()
            .zip(x.data.iter())
            .map(|(a, b)| *a + *b)
            .collect();

        Mat {
            data,
            shape: self.shape.clone(),
        }
    }
}

impl From<Vec<f32>> for Mat {
    /// Column vector.
    fn from(x: Vec<f32>) -> Self {
        let shape = vec![x.len(), 1];
        Self { shape, data: x }
    }
}

impl From<Mat> for Vec<f32> {
    fn from(x: Mat) -> Self {
        x.data
    }
}
