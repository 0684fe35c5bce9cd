//! Daubechies Wavelet Transform
//!
//! Forward discrete wavelet transform used to reduce a captured sample
//! window to a fingerprint. The transform is the classic periodized
//! pyramid: at each level the current block is convolved with the
//! scaling (lowpass) and wavelet (highpass) filters with wrap-around
//! indexing, decimated by two, and the pyramid recurses on the lowpass
//! half. The coefficient layout is descending-scale:
//!
//! ```text
//! index 0          overall scaling coefficient (coarsest)
//! index 1          coarsest detail
//! indexes 2..4     next finer detail band
//! indexes 2^(k-1)..2^k   detail band at level k
//! ```
//!
//! which is exactly the band structure the band-averaged distance mode
//! consumes. Input length must be a power of two.
//!
//! ## Example
//!
//! ```rust
//! use wavemark_core::wavelet::{DaubechiesOrder, WaveletTransform};
//!
//! let mut wt = WaveletTransform::new(DaubechiesOrder::D4);
//! let mut window = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
//! wt.transform(&mut window);
//! // Energy is preserved by the orthonormal filter bank
//! let energy: f64 = window.iter().map(|c| c * c).sum();
//! assert!((energy - 204.0).abs() < 1e-9);
//! ```

/// Daubechies filter order: the number of filter taps.
///
/// `D2` is the Haar wavelet; higher orders trade time localization for
/// smoother frequency response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaubechiesOrder {
    D2,
    D4,
    D6,
    D8,
    D10,
    D12,
    D14,
    D16,
    D18,
    D20,
}

// Orthonormal Daubechies scaling coefficients, NR/Burkardt ordering.
// Each table sums to sqrt(2) and has unit energy.
const DAUB2: [f64; 2] = [0.707_106_781_186_547_6, 0.707_106_781_186_547_6];

const DAUB4: [f64; 4] = [
    0.482_962_913_144_534_1,
    0.836_516_303_737_807_9,
    0.224_143_868_042_013_4,
    -0.129_409_522_551_260_4,
];

const DAUB6: [f64; 6] = [
    0.332_670_552_950_082_6,
    0.806_891_509_311_092_5,
    0.459_877_502_118_491_5,
    -0.135_011_020_010_254_6,
    -0.085_441_273_882_026_7,
    0.035_226_291_885_709_5,
];

const DAUB8: [f64; 8] = [
    0.230_377_813_308_896_5,
    0.714_846_570_552_915_7,
    0.630_880_767_929_858_9,
    -0.027_983_769_416_859_9,
    -0.187_034_811_719_093_1,
    0.030_841_381_835_560_7,
    0.032_883_011_666_885_2,
    -0.010_597_401_785_069_0,
];

const DAUB10: [f64; 10] = [
    0.160_102_397_974_192_9,
    0.603_829_269_797_189_5,
    0.724_308_528_437_772_6,
    0.138_428_145_901_320_3,
    -0.242_294_887_066_382_3,
    -0.032_244_869_584_638_1,
    0.077_571_493_840_045_9,
    -0.006_241_490_212_798_3,
    -0.012_580_751_999_082_0,
    0.003_335_725_285_473_8,
];

const DAUB12: [f64; 12] = [
    0.111_540_743_350_109_5,
    0.494_623_890_398_453_3,
    0.751_133_908_021_095_9,
    0.315_250_351_709_198_2,
    -0.226_264_693_965_440_0,
    -0.129_766_867_567_262_5,
    0.097_501_605_587_322_5,
    0.027_522_865_530_305_3,
    -0.031_582_039_317_486_2,
    0.000_553_842_201_161_4,
    0.004_777_257_510_945_5,
    -0.001_077_301_085_308_5,
];

const DAUB14: [f64; 14] = [
    0.077_852_054_085_003_7,
    0.396_539_319_481_891_2,
    0.729_132_090_846_195_7,
    0.469_782_287_405_188_9,
    -0.143_906_003_928_521_2,
    -0.224_036_184_993_841_2,
    0.071_309_219_266_827_2,
    0.080_612_609_151_077_4,
    -0.038_029_936_935_010_4,
    -0.016_574_541_630_665_5,
    0.012_550_998_556_098_6,
    0.000_429_577_972_921_4,
    -0.001_801_640_704_047_3,
    0.000_353_713_799_974_5,
];

const DAUB16: [f64; 16] = [
    0.054_415_842_243_107_2,
    0.312_871_590_914_316_6,
    0.675_630_736_297_319_5,
    0.585_354_683_654_215_9,
    -0.015_829_105_256_382_3,
    -0.284_015_542_961_582_4,
    0.000_472_484_573_912_4,
    0.128_747_426_620_489_3,
    -0.017_369_301_001_809_0,
    -0.044_088_253_930_797_1,
    0.013_981_027_917_400_1,
    0.008_746_094_047_406_5,
    -0.004_870_352_993_452_0,
    -0.000_391_740_373_377_0,
    0.000_675_449_406_450_6,
    -0.000_117_476_784_124_8,
];

const DAUB18: [f64; 18] = [
    0.038_077_947_363_877_8,
    0.243_834_674_612_585_8,
    0.604_823_123_690_095_5,
    0.657_288_078_051_273_6,
    0.133_197_385_824_988_3,
    -0.293_273_783_279_166_3,
    -0.096_840_783_222_949_2,
    0.148_540_749_338_125_6,
    0.030_725_681_479_338_5,
    -0.067_632_829_061_327_9,
    0.000_250_947_114_834_0,
    0.022_361_662_123_679_8,
    -0.004_723_204_757_751_8,
    -0.004_281_503_682_463_5,
    0.001_847_646_883_056_3,
    0.000_230_385_763_523_2,
    -0.000_251_963_188_942_7,
    0.000_039_347_320_316_3,
];

const DAUB20: [f64; 20] = [
    0.026_670_057_900_547_3,
    0.188_176_800_077_634_7,
    0.527_201_188_931_575_7,
    0.688_459_039_453_436_3,
    0.281_172_343_660_571_5,
    -0.249_846_424_327_159_8,
    -0.195_946_274_377_286_2,
    0.127_369_340_335_754_1,
    0.093_057_364_603_554_7,
    -0.071_394_147_166_350_1,
    -0.029_457_536_821_839_9,
    0.033_212_674_059_361_2,
    0.003_606_553_566_988_3,
    -0.010_733_175_483_300_7,
    0.001_395_351_746_994_0,
    0.001_992_405_294_990_8,
    -0.000_685_856_695_004_6,
    -0.000_116_466_854_994_3,
    0.000_093_588_670_320_2,
    -0.000_013_264_202_894_5,
];

impl DaubechiesOrder {
    /// Parse from the numeric order (2, 4, ..., 20).
    pub fn from_order(order: u32) -> Option<Self> {
        match order {
            2 => Some(Self::D2),
            4 => Some(Self::D4),
            6 => Some(Self::D6),
            8 => Some(Self::D8),
            10 => Some(Self::D10),
            12 => Some(Self::D12),
            14 => Some(Self::D14),
            16 => Some(Self::D16),
            18 => Some(Self::D18),
            20 => Some(Self::D20),
            _ => None,
        }
    }

    /// Numeric order (number of taps).
    pub fn order(&self) -> u32 {
        self.taps().len() as u32
    }

    /// Scaling (lowpass) filter taps.
    pub fn taps(&self) -> &'static [f64] {
        match self {
            Self::D2 => &DAUB2,
            Self::D4 => &DAUB4,
            Self::D6 => &DAUB6,
            Self::D8 => &DAUB8,
            Self::D10 => &DAUB10,
            Self::D12 => &DAUB12,
            Self::D14 => &DAUB14,
            Self::D16 => &DAUB16,
            Self::D18 => &DAUB18,
            Self::D20 => &DAUB20,
        }
    }
}

/// Forward Daubechies pyramid transform with a reusable scratch buffer.
///
/// The transform is a pure function of the input buffer; the struct only
/// exists so repeated windows do not reallocate.
#[derive(Debug, Clone)]
pub struct WaveletTransform {
    order: DaubechiesOrder,
    scratch: Vec<f64>,
}

impl WaveletTransform {
    pub fn new(order: DaubechiesOrder) -> Self {
        Self {
            order,
            scratch: Vec::new(),
        }
    }

    /// The configured filter order.
    pub fn order(&self) -> DaubechiesOrder {
        self.order
    }

    /// In-place forward transform of a power-of-two-length buffer.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` is not a power of two. Window lengths are
    /// coerced to a power of two at configuration time, so a violation
    /// here is a caller bug.
    pub fn transform(&mut self, data: &mut [f64]) {
        let n = data.len();
        assert!(
            n.is_power_of_two() && n >= 2,
            "wavelet input length must be a power of two, got {n}"
        );

        let lo = self.order.taps();
        let k = lo.len();
        if self.scratch.len() < n {
            self.scratch.resize(n, 0.0);
        }

        // Quadrature mirror highpass: g[i] = (-1)^i * lo[k-1-i]
        let mut m = n;
        while m >= 2 {
            let half = m / 2;
            for i in 0..half {
                let base = 2 * i;
                let mut smooth = 0.0;
                let mut detail = 0.0;
                for (j, &c) in lo.iter().enumerate() {
                    let x = data[(base + j) % m];
                    smooth += c * x;
                    let g = if j % 2 == 0 { lo[k - 1 - j] } else { -lo[k - 1 - j] };
                    detail += g * x;
                }
                self.scratch[i] = smooth;
                self.scratch[i + half] = detail;
            }
            data[..m].copy_from_slice(&self.scratch[..m]);
            m = half;
        }
    }

    /// Transform into a caller-owned output vector, leaving `input` intact.
    pub fn transform_to(&mut self, input: &[f64], output: &mut Vec<f64>) {
        output.clear();
        output.extend_from_slice(input);
        self.transform(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn energy(v: &[f64]) -> f64 {
        v.iter().map(|x| x * x).sum()
    }

    #[test]
    fn test_order_parse() {
        assert_eq!(DaubechiesOrder::from_order(2), Some(DaubechiesOrder::D2));
        assert_eq!(DaubechiesOrder::from_order(12), Some(DaubechiesOrder::D12));
        assert_eq!(DaubechiesOrder::from_order(3), None);
        assert_eq!(DaubechiesOrder::from_order(22), None);
    }

    #[test]
    fn test_filters_unit_energy() {
        for order in [
            DaubechiesOrder::D2,
            DaubechiesOrder::D4,
            DaubechiesOrder::D6,
            DaubechiesOrder::D8,
            DaubechiesOrder::D10,
            DaubechiesOrder::D12,
            DaubechiesOrder::D14,
            DaubechiesOrder::D16,
            DaubechiesOrder::D18,
            DaubechiesOrder::D20,
        ] {
            let taps = order.taps();
            assert_eq!(taps.len(), order.order() as usize);
            let e = energy(taps);
            assert!(
                (e - 1.0).abs() < 1e-12,
                "{order:?} taps should have unit energy, got {e}"
            );
            let sum: f64 = taps.iter().sum();
            assert!(
                (sum - std::f64::consts::SQRT_2).abs() < 1e-12,
                "{order:?} taps should sum to sqrt(2), got {sum}"
            );
        }
    }

    #[test]
    fn test_haar_constant_signal() {
        let mut wt = WaveletTransform::new(DaubechiesOrder::D2);
        let mut data = vec![3.0; 8];
        wt.transform(&mut data);
        // All energy collapses into the scaling coefficient
        assert!((data[0] - 3.0 * 8.0_f64.sqrt()).abs() < 1e-12);
        for &d in &data[1..] {
            assert!(d.abs() < 1e-12, "details of a constant signal must vanish");
        }
    }

    #[test]
    fn test_energy_preserved() {
        let signal: Vec<f64> = (0..64).map(|i| (i as f64 * 0.37).sin() * 5.0).collect();
        for order in [DaubechiesOrder::D2, DaubechiesOrder::D4, DaubechiesOrder::D20] {
            let mut wt = WaveletTransform::new(order);
            let mut data = signal.clone();
            wt.transform(&mut data);
            let e = energy(&data);
            assert!(
                (e - energy(&signal)).abs() < 1e-8,
                "{order:?}: orthonormal transform must preserve energy"
            );
        }
    }

    #[test]
    fn test_descending_scale_layout() {
        // A pure step concentrates low-scale energy at the front indexes.
        let mut data = vec![0.0; 16];
        for v in data.iter_mut().skip(8) {
            *v = 1.0;
        }
        let mut wt = WaveletTransform::new(DaubechiesOrder::D2);
        wt.transform(&mut data);
        // Coarse half must carry more energy than the finest band
        let coarse = energy(&data[..4]);
        let fine = energy(&data[8..]);
        assert!(coarse > fine);
    }

    #[test]
    fn test_transform_to_leaves_input() {
        let input = vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0, 4.0, -4.0];
        let mut wt = WaveletTransform::new(DaubechiesOrder::D4);
        let mut out = Vec::new();
        wt.transform_to(&input, &mut out);
        assert_eq!(input[0], 1.0);
        assert_eq!(out.len(), input.len());
        assert!((energy(&out) - energy(&input)).abs() < 1e-10);
    }

    #[test]
    fn test_deterministic() {
        let signal: Vec<f64> = (0..32).map(|i| ((i * 7 + 3) % 13) as f64).collect();
        let mut wt = WaveletTransform::new(DaubechiesOrder::D12);
        let mut a = signal.clone();
        let mut b = signal.clone();
        wt.transform(&mut a);
        wt.transform(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_long_filter_short_window() {
        // A 20-tap filter on an 8-point window wraps several times but
        // must still conserve energy.
        let signal = vec![1.0, 4.0, 2.0, 8.0, 5.0, 7.0, 1.0, 0.0];
        let mut wt = WaveletTransform::new(DaubechiesOrder::D20);
        let mut data = signal.clone();
        wt.transform(&mut data);
        assert!((energy(&data) - energy(&signal)).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn test_non_power_of_two_panics() {
        let mut wt = WaveletTransform::new(DaubechiesOrder::D2);
        let mut data = vec![0.0; 12];
        wt.transform(&mut data);
    }
}
