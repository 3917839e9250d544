//! 目标裁剪图保存

use std::fs;
use std::path::PathBuf;

use image::{imageops, RgbImage};

use crate::detection::{BBox, ObjectId};
use crate::error::PersistError;

use super::wall_clock_ms;

/// 裁剪图分类目录
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CropBucket {
    Confirmed,
    Ejected,
}

impl CropBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            CropBucket::Confirmed => "confirmed",
            CropBucket::Ejected => "ejected",
        }
    }
}

/// 裁剪图接收端
pub trait CropSink {
    fn save_crop(
        &mut self,
        frame: &RgbImage,
        bbox: &BBox,
        class_name: &str,
        id: ObjectId,
        bucket: CropBucket,
    ) -> Result<PathBuf, PersistError>;
}

/// 保存到 `<root>/<bucket>/<class>/id<ID>_t<ms>.jpg`
#[derive(Clone, Debug)]
pub struct CropStore {
    root: PathBuf,
    padding: u32,
}

impl CropStore {
    pub fn new(root: impl Into<PathBuf>, padding: u32) -> Self {
        Self {
            root: root.into(),
            padding,
        }
    }

    /// 外扩并裁剪到画面内
    pub fn crop(&self, frame: &RgbImage, bbox: &BBox) -> Result<RgbImage, PersistError> {
        let region = bbox.padded(self.padding, frame.width(), frame.height());
        let (x1, y1, x2, y2) = region;
        if x2 <= x1 || y2 <= y1 {
            return Err(PersistError::EmptyCrop(region));
        }
        Ok(imageops::crop_imm(frame, x1, y1, x2 - x1, y2 - y1).to_image())
    }
}

impl CropSink for CropStore {
    fn save_crop(
        &mut self,
        frame: &RgbImage,
        bbox: &BBox,
        class_name: &str,
        id: ObjectId,
        bucket: CropBucket,
    ) -> Result<PathBuf, PersistError> {
        let crop = self.crop(frame, bbox)?;
        let dir = self.root.join(bucket.as_str()).join(class_name);
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("id{}_t{}.jpg", id, wall_clock_ms()));
        crop.save(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_crop_is_padded_and_clamped() {
        let frame = RgbImage::from_pixel(100, 80, Rgb([10, 20, 30]));
        let store = CropStore::new("unused", 8);

        let inner = store.crop(&frame, &BBox::new(20.0, 20.0, 40.0, 30.0)).unwrap();
        assert_eq!(inner.dimensions(), (36, 26));

        let edge = store.crop(&frame, &BBox::new(0.0, 0.0, 95.0, 79.0)).unwrap();
        assert_eq!(edge.dimensions(), (99, 79));
    }

    #[test]
    fn test_degenerate_box_is_rejected() {
        let frame = RgbImage::new(50, 50);
        let store = CropStore::new("unused", 0);
        assert!(matches!(
            store.crop(&frame, &BBox::new(60.0, 60.0, 70.0, 70.0)),
            Err(PersistError::EmptyCrop(_))
        ));
    }

    #[test]
    fn test_save_crop_layout() {
        let dir = tempfile::tempdir().unwrap();
        let frame = RgbImage::from_pixel(64, 64, Rgb([200, 100, 50]));
        let mut store = CropStore::new(dir.path(), 4);
        let path = store
            .save_crop(
                &frame,
                &BBox::new(10.0, 10.0, 30.0, 30.0),
                "Elephant ear",
                12,
                CropBucket::Ejected,
            )
            .unwrap();
        assert!(path.exists());
        assert!(path.starts_with(dir.path().join("ejected").join("Elephant ear")));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("id12_t") && name.ends_with(".jpg"));
    }
}
