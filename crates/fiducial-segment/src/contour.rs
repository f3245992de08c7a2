//! 8-connected boundary walk around a labelled region.

use fiducial_core::Pixel;

use crate::label::LabelledImage;

// compass order N, NE, E, SE, S, SW, W, NW
const OFFSETS: [(isize, isize); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

#[inline]
fn clockwise(dir: usize) -> usize {
    (dir + 1) % 8
}

#[inline]
fn opposite(dir: usize) -> usize {
    (dir + 4) % 8
}

fn matches_region(lmg: &LabelledImage, x: isize, y: isize, canon: u16) -> bool {
    let label = lmg.label_at(x, y);
    label != 0 && lmg.canonical_of(label) == canon
}

/// Seed pixel: scan the top row of the clip box inward from both ends
/// simultaneously and take the first pixel that belongs to the region, so
/// the topmost extreme is found without left/right bias.
fn seed_on_top_row(lmg: &LabelledImage, region: usize) -> Pixel {
    let clip = lmg.clip(region);
    let canon = region as u16 + 1;
    let top = clip.min.y as isize;

    let mut width = clip.max.x - clip.min.x + 1;
    if width % 2 == 1 {
        width += 1;
    }

    for i in 0..width / 2 {
        let left = (clip.min.x + i) as isize;
        if matches_region(lmg, left, top, canon) {
            return Pixel::new(left as u16, top as u16);
        }
        let right = (clip.max.x - i) as isize;
        if matches_region(lmg, right, top, canon) {
            return Pixel::new(right as u16, top as u16);
        }
    }

    unreachable!("clip top row contains no pixel of its region");
}

/// Walk the boundary of a usable region clockwise.
///
/// Starting north of the seed, each step probes the eight compass
/// directions clockwise and takes the first neighbour inside the region;
/// the next probe then starts one step clockwise of the direction back to
/// the previous pixel, which keeps the walk hugging the boundary. The
/// emitted chain starts and ends at the seed pixel.
pub fn trace_contour(lmg: &LabelledImage, region: usize) -> Vec<Pixel> {
    let seed = seed_on_top_row(lmg, region);
    let canon = region as u16 + 1;

    let mut contour = vec![seed];
    let mut current = seed;
    let mut dir = 0usize; // N
    let mut first_run = true;

    loop {
        let mut next = current;
        for _ in 0..8 {
            let (dx, dy) = OFFSETS[dir];
            let (nx, ny) = (current.x as isize + dx, current.y as isize + dy);
            if matches_region(lmg, nx, ny, canon) {
                next = Pixel::new(nx as u16, ny as u16);
                break;
            }
            dir = clockwise(dir);
        }

        if !first_run && current == seed {
            break;
        }

        contour.push(next);
        current = next;
        dir = clockwise(opposite(dir));
        first_run = false;
    }

    contour
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::label_adaptive;
    use fiducial_core::GrayImage;

    fn blob_frame() -> GrayImage {
        let mut img = GrayImage::from_raw(64, 64, vec![220; 64 * 64]);
        for y in 20..30 {
            for x in 16..28 {
                img.set(x, y, 10);
            }
        }
        img
    }

    #[test]
    fn contour_is_closed_and_eight_connected() {
        let img = blob_frame();
        let lmg = label_adaptive(&img.as_view(), 11, 5, None);
        let region = (0..lmg.region_count()).find(|&i| lmg.is_usable(i)).unwrap();

        let contour = trace_contour(&lmg, region);
        assert!(contour.len() > 4);
        assert_eq!(contour.first(), contour.last(), "walk must close");

        for pair in contour.windows(2) {
            let dx = (pair[0].x as i32 - pair[1].x as i32).abs();
            let dy = (pair[0].y as i32 - pair[1].y as i32).abs();
            assert!(dx <= 1 && dy <= 1 && (dx + dy) > 0, "{pair:?}");
        }
    }

    #[test]
    fn rectangle_contour_walks_clockwise_from_the_top() {
        let img = blob_frame();
        let lmg = label_adaptive(&img.as_view(), 11, 5, None);
        let region = (0..lmg.region_count()).find(|&i| lmg.is_usable(i)).unwrap();

        let contour = trace_contour(&lmg, region);
        assert_eq!(contour[0], Pixel::new(16, 20));
        // the first leg heads east along the top edge
        assert_eq!(contour[1], Pixel::new(17, 20));
        assert_eq!(contour[2], Pixel::new(18, 20));
        // perimeter of a 12x10 rectangle plus the repeated seed
        assert_eq!(contour.len(), 2 * 12 + 2 * 10 - 4 + 1);
    }
}
