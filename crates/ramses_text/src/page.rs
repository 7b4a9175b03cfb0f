//! One fixed-size atlas page with a guillotine free-rectangle packer
//!
//! The page starts with a single free quad covering all of it. Claiming space
//! takes the top-left corner of a free quad and splits the remainder into a
//! right and a bottom part. Releasing space merges free quads that share a
//! full edge until no more merges are possible.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct QuadOffset {
    pub x: u32,
    pub y: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct QuadSize {
    pub width: u32,
    pub height: u32,
}

impl QuadSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn fits_into(&self, other: &QuadSize) -> bool {
        self.width <= other.width && self.height <= other.height
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Quad {
    pub origin: QuadOffset,
    pub size: QuadSize,
}

impl Quad {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            origin: QuadOffset { x, y },
            size: QuadSize { width, height },
        }
    }

    fn right(&self) -> u32 {
        self.origin.x + self.size.width
    }

    fn bottom(&self) -> u32 {
        self.origin.y + self.size.height
    }

    /// Union of two quads sharing one full edge
    fn merged_with(&self, other: &Quad) -> Option<Quad> {
        let same_columns = self.origin.x == other.origin.x && self.size.width == other.size.width;
        let same_rows = self.origin.y == other.origin.y && self.size.height == other.size.height;

        if same_columns && self.bottom() == other.origin.y {
            Some(Quad::new(
                self.origin.x,
                self.origin.y,
                self.size.width,
                self.size.height + other.size.height,
            ))
        } else if same_columns && other.bottom() == self.origin.y {
            other.merged_with(self)
        } else if same_rows && self.right() == other.origin.x {
            Some(Quad::new(
                self.origin.x,
                self.origin.y,
                self.size.width + other.size.width,
                self.size.height,
            ))
        } else if same_rows && other.right() == self.origin.x {
            other.merged_with(self)
        } else {
            None
        }
    }

    pub fn overlaps(&self, other: &Quad) -> bool {
        self.origin.x < other.right()
            && other.origin.x < self.right()
            && self.origin.y < other.bottom()
            && other.origin.y < self.bottom()
    }
}

/// Free-space bookkeeping and pixel storage of one atlas page
#[derive(Clone, Debug)]
pub struct GlyphTexturePage {
    size: QuadSize,
    free: Vec<Quad>,
    pixels: Vec<u8>,
    dirty: bool,
}

impl GlyphTexturePage {
    pub fn new(size: QuadSize) -> Self {
        Self {
            size,
            free: vec![Quad {
                origin: QuadOffset::default(),
                size,
            }],
            pixels: vec![0; size.area() as usize],
            dirty: true,
        }
    }

    pub fn size(&self) -> QuadSize {
        self.size
    }

    pub fn free_quads(&self) -> &[Quad] {
        &self.free
    }

    /// Index of the smallest free quad that can hold `size`
    pub fn find_free_space(&self, size: QuadSize) -> Option<usize> {
        self.free
            .iter()
            .enumerate()
            .filter(|(_, quad)| size.fits_into(&quad.size))
            .min_by_key(|(_, quad)| quad.size.area())
            .map(|(index, _)| index)
    }

    /// Claim `size` at the origin of free quad `index`
    ///
    /// Panics if `index` is out of range or the quad is too small; callers
    /// get the index from [`find_free_space`](Self::find_free_space).
    pub fn claim_space(&mut self, index: usize, size: QuadSize) -> Quad {
        let free = self.free.remove(index);
        debug_assert!(size.fits_into(&free.size));

        let rest_width = free.size.width - size.width;
        let rest_height = free.size.height - size.height;

        // Split along the longer leftover axis so the larger remainder stays whole.
        let (right, bottom) = if rest_height > rest_width {
            (
                Quad::new(free.origin.x + size.width, free.origin.y, rest_width, size.height),
                Quad::new(free.origin.x, free.origin.y + size.height, free.size.width, rest_height),
            )
        } else {
            (
                Quad::new(free.origin.x + size.width, free.origin.y, rest_width, free.size.height),
                Quad::new(free.origin.x, free.origin.y + size.height, size.width, rest_height),
            )
        };

        for part in [right, bottom] {
            if part.size.area() > 0 {
                self.free.push(part);
            }
        }
        self.merge_free_quads();

        Quad {
            origin: free.origin,
            size,
        }
    }

    /// Return a claimed quad to the free list
    pub fn release_space(&mut self, quad: Quad) {
        debug_assert!(!self.free.iter().any(|f| f.overlaps(&quad)));
        self.free.push(quad);
        self.merge_free_quads();
    }

    /// Whether every size in `sizes` fits, claimed in the given order
    pub fn can_fit_all(&self, sizes: &[QuadSize]) -> bool {
        let mut simulation = GlyphTexturePage {
            size: self.size,
            free: self.free.clone(),
            pixels: Vec::new(),
            dirty: false,
        };
        sizes.iter().all(|size| match simulation.find_free_space(*size) {
            Some(index) => {
                simulation.claim_space(index, *size);
                true
            }
            None => false,
        })
    }

    fn merge_free_quads(&mut self) {
        'restart: loop {
            for i in 0..self.free.len() {
                for j in (i + 1)..self.free.len() {
                    if let Some(merged) = self.free[i].merged_with(&self.free[j]) {
                        self.free[i] = merged;
                        self.free.remove(j);
                        continue 'restart;
                    }
                }
            }
            break;
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pixel data
    // ─────────────────────────────────────────────────────────────────────────

    /// Copy a `width x height` bitmap into the page at `origin`
    pub fn write_bitmap(&mut self, origin: QuadOffset, width: u32, height: u32, data: &[u8]) {
        let page_width = self.size.width as usize;
        let width = width as usize;
        for row in 0..height as usize {
            let src = &data[row * width..(row + 1) * width];
            let start = (origin.y as usize + row) * page_width + origin.x as usize;
            self.pixels[start..start + width].copy_from_slice(src);
        }
        self.dirty = true;
    }

    /// Zero a region of the page
    pub fn clear_region(&mut self, quad: Quad) {
        let page_width = self.size.width as usize;
        for row in quad.origin.y..quad.bottom() {
            let start = row as usize * page_width + quad.origin.x as usize;
            self.pixels[start..start + quad.size.width as usize].fill(0);
        }
        self.dirty = true;
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
