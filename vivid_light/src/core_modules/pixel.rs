// THEORY (1D Pixel Heuristics):
// The `Pixel` module is the most fundamental unit of the classifier. It is a
// "dumb" data container for a single blue-green-red pixel plus the one
// single-pixel heuristic the classifier is built on: color purity. Anything that
// needs more than one pixel (planes, masks, counts) belongs in higher modules.
//
// Channel forms:
// - raw (0..255 as u8): the byte exactly as it arrived, in B, G, R order
// - normalized (0..1): divide by 255.0, used for all purity math
//
// Purity:
//   purity(dominant, a, b) = dominant * (1 - a) * (1 - b) * gain * scale
// rewards a pixel where one channel is high AND the other two are low. A pixel
// that is merely "reddish" (red high, green also high) scores near zero. With the
// default gain of 2.0 and scale of 256.0 the raw score reaches 512 for a fully
// saturated channel, so it is clamped to [0, 255] and truncated to a byte.
//
// The arithmetic is done in f64 and multiplied left to right so that scores land
// on the same side of the mask threshold as a reference float64 pipeline would.

pub mod pixel {
    pub type Channel = u8;
    pub type NormalizedChannel = f64;
    pub type PurityScore = u8;

    /// Number of interleaved channels in a frame buffer (blue, green, red).
    pub const CHANNELS: usize = 3;

    const CHANNEL_MAX: NormalizedChannel = 255.0;

    /// A single blue-green-red pixel with its normalized channels precomputed.
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct Pixel {
        pub blue: Channel,
        pub green: Channel,
        pub red: Channel,
        /// The blue channel value (0.0-1.0).
        pub blue_normalized: NormalizedChannel,
        /// The green channel value (0.0-1.0).
        pub green_normalized: NormalizedChannel,
        /// The red channel value (0.0-1.0).
        pub red_normalized: NormalizedChannel,
    }

    impl Pixel {
        pub fn new(blue: Channel, green: Channel, red: Channel) -> Self {
            Pixel {
                blue,
                green,
                red,
                blue_normalized: blue as NormalizedChannel / CHANNEL_MAX,
                green_normalized: green as NormalizedChannel / CHANNEL_MAX,
                red_normalized: red as NormalizedChannel / CHANNEL_MAX,
            }
        }

        /// Unclamped purity of `dominant` against the two other channels.
        #[inline]
        pub fn raw_purity(
            dominant: NormalizedChannel,
            other_a: NormalizedChannel,
            other_b: NormalizedChannel,
            gain: f64,
            scale: f64,
        ) -> f64 {
            dominant * (1.0 - other_a) * (1.0 - other_b) * gain * scale
        }

        /// Clamps a raw purity to the byte range and truncates toward zero.
        #[inline]
        pub fn to_score(raw: f64) -> PurityScore {
            raw.clamp(0.0, CHANNEL_MAX) as PurityScore
        }

        /// How purely this pixel expresses red: high red, low blue and low green.
        pub fn red_purity(&self, gain: f64, scale: f64) -> PurityScore {
            Self::to_score(Self::raw_purity(
                self.red_normalized,
                self.blue_normalized,
                self.green_normalized,
                gain,
                scale,
            ))
        }

        /// How purely this pixel expresses green: high green, low blue and low red.
        pub fn green_purity(&self, gain: f64, scale: f64) -> PurityScore {
            Self::to_score(Self::raw_purity(
                self.green_normalized,
                self.blue_normalized,
                self.red_normalized,
                gain,
                scale,
            ))
        }
    }

    impl From<[Channel; CHANNELS]> for Pixel {
        fn from(bgr: [Channel; CHANNELS]) -> Self {
            Pixel::new(bgr[0], bgr[1], bgr[2])
        }
    }

    impl From<Pixel> for [Channel; CHANNELS] {
        fn from(pixel: Pixel) -> Self {
            [pixel.blue, pixel.green, pixel.red]
        }
    }
}
