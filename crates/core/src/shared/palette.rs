/// An RGB overlay color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// The fixed 8-color cycle used to tell neighboring detections apart.
pub const PALETTE: [Rgb; 8] = [
    Rgb(255, 0, 0),   // red
    Rgb(255, 128, 0), // orange
    Rgb(255, 255, 0), // yellow
    Rgb(0, 255, 0),   // green
    Rgb(0, 128, 255), // azure
    Rgb(0, 255, 255), // cyan
    Rgb(0, 0, 255),   // blue
    Rgb(255, 0, 255), // magenta
];

/// Color for the detection at position `index` in a result sequence.
///
/// A pure function of the index so annotation is reproducible from a
/// detection list alone.
pub fn color_for(index: usize) -> Rgb {
    PALETTE[index % PALETTE.len()]
}
