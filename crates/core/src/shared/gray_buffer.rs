use ndarray::ArrayView2;

/// Single-channel working buffer the multi-scale search runs on.
///
/// Produced by the preprocessor at a fraction of the source frame's
/// resolution and discarded after the detection call; never cached
/// across frames.
#[derive(Clone, Debug)]
pub struct GrayBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl GrayBuffer {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize),
            "data length must equal width * height"
        );
        Self {
            data,
            width,
            height,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    pub fn as_ndarray(&self) -> ArrayView2<'_, u8> {
        ArrayView2::from_shape((self.height as usize, self.width as usize), &self.data)
            .expect("GrayBuffer data length must match dimensions")
    }
}
