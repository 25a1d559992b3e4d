use crate::RenderError;
use crate::writer::StreamingPdfWriter;
use lopdf::{Object, ObjectId, Stream, dictionary};
use std::io::Write;

/// Pixel data ready to be placed in an image XObject.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// A JPEG file passed through unchanged.
    Jpeg {
        data: Vec<u8>,
        width: u32,
        height: u32,
        /// 1 for grayscale, 3 for RGB, 4 for CMYK.
        components: u8,
    },
    /// Decoded 8 bit RGB samples with an optional alpha channel.
    Rgb {
        pixels: Vec<u8>,
        alpha: Option<Vec<u8>>,
        width: u32,
        height: u32,
    },
}

impl ImageSource {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            ImageSource::Jpeg { width, height, .. } | ImageSource::Rgb { width, height, .. } => (*width, *height),
        }
    }
}

pub(crate) fn write_image<W: Write>(
    writer: &mut StreamingPdfWriter<W>,
    source: ImageSource,
) -> Result<ObjectId, RenderError> {
    let stream = match source {
        ImageSource::Jpeg {
            data,
            width,
            height,
            components,
        } => {
            let color_space = match components {
                1 => "DeviceGray",
                4 => "DeviceCMYK",
                _ => "DeviceRGB",
            };
            let mut dict = dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => color_space,
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            };
            if components == 4 {
                // Adobe writes inverted CMYK JPEGs.
                dict.set("Decode", vec![1.into(), 0.into(), 1.into(), 0.into(), 1.into(), 0.into(), 1.into(), 0.into()]);
            }
            Stream::new(dict, data)
        }
        ImageSource::Rgb {
            pixels,
            alpha,
            width,
            height,
        } => {
            let mut dict = dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            };
            if let Some(alpha) = alpha {
                let mask = Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => width as i64,
                        "Height" => height as i64,
                        "ColorSpace" => "DeviceGray",
                        "BitsPerComponent" => 8,
                    },
                    alpha,
                );
                let mask_id = writer.write_object(Object::Stream(mask))?;
                dict.set("SMask", mask_id);
            }
            Stream::new(dict, pixels)
        }
    };
    Ok(writer.write_object(Object::Stream(stream))?)
}
