//! Normalized box blur.
//!
//! Separable running-sum implementation. Horizontal window sums are
//! computed per row on demand and a row of column sums slides down the
//! image, so scratch memory is a few rows regardless of image or kernel
//! size. Borders reflect without repeating the edge pixel
//! (`...c b | a b c...`), and even kernels are anchored at `kernel / 2`, so
//! the window for position `i` is `[i - kernel / 2, i - kernel / 2 + kernel)`.

use crate::decode::DecodedImage;

/// Blur with a `kernel x kernel` box filter. A kernel of 0 or 1 returns a copy.
pub fn box_blur(image: &DecodedImage, kernel: u32) -> DecodedImage {
    if kernel <= 1 || image.is_empty() {
        return image.clone();
    }

    let k = kernel as usize;
    let anchor = (k / 2) as isize;
    let height = image.height as usize;
    let stride = image.row_stride();
    let window = BoxWindow {
        kernel: k,
        anchor,
        width: image.width as usize,
    };

    let mut column = vec![0u64; stride];
    let mut entering = vec![0u32; stride];
    let mut leaving = vec![0u32; stride];

    for j in 0..k as isize {
        let y = reflect101(j - anchor, height) as u32;
        window.row_sums(image.row(y), &mut entering);
        for (acc, v) in column.iter_mut().zip(&entering) {
            *acc += *v as u64;
        }
    }

    let area = (k * k) as u64;
    let mut output = vec![0u8; image.pixels.len()];
    for (y, dst_row) in output.chunks_exact_mut(stride).enumerate() {
        for (dst, acc) in dst_row.iter_mut().zip(&column) {
            *dst = ((acc + area / 2) / area).min(255) as u8;
        }
        if y + 1 == height {
            break;
        }
        let out_y = reflect101(y as isize - anchor, height) as u32;
        let in_y = reflect101(y as isize - anchor + k as isize, height) as u32;
        if out_y == in_y {
            continue;
        }
        window.row_sums(image.row(in_y), &mut entering);
        window.row_sums(image.row(out_y), &mut leaving);
        for ((acc, add), sub) in column.iter_mut().zip(&entering).zip(&leaving) {
            *acc = *acc + *add as u64 - *sub as u64;
        }
    }

    DecodedImage::new(image.width, image.height, output)
}

struct BoxWindow {
    kernel: usize,
    anchor: isize,
    width: usize,
}

impl BoxWindow {
    /// Horizontal window sums of one packed RGB row.
    fn row_sums(&self, src_row: &[u8], dst_row: &mut [u32]) {
        let mut sum = [0u32; 3];
        for j in 0..self.kernel as isize {
            let sx = reflect101(j - self.anchor, self.width) * 3;
            for c in 0..3 {
                sum[c] += src_row[sx + c] as u32;
            }
        }
        for x in 0..self.width {
            dst_row[x * 3..x * 3 + 3].copy_from_slice(&sum);
            let out_x = reflect101(x as isize - self.anchor, self.width) * 3;
            let in_x = reflect101(x as isize - self.anchor + self.kernel as isize, self.width) * 3;
            for c in 0..3 {
                sum[c] = sum[c] + src_row[in_x + c] as u32 - src_row[out_x + c] as u32;
            }
        }
    }
}

/// Map `i` into `[0, len)` by mirroring about the edge pixels.
#[inline]
fn reflect101(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let len = len as isize;
    let period = 2 * (len - 1);
    let mut i = i.rem_euclid(period);
    if i >= len {
        i = period - i;
    }
    i as usize
}
