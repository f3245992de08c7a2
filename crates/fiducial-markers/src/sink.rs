//! Reference debug sinks: a text stream and an HTML directory with PNGs.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use fiducial_core::{DebugSink, GrayImageView};

/// Sink that writes diagnostics to any `Write`; images are reported by
/// their dimensions only.
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the sink and hand the writer back.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> DebugSink for TextSink<W> {
    fn log(&mut self, text: Option<&str>, image: Option<&GrayImageView<'_>>) {
        if let Some(text) = text {
            let _ = writeln!(self.out, "{text}");
        }
        if let Some(image) = image {
            let _ = writeln!(
                self.out,
                "{}x{} image (text sink cannot show images)",
                image.width, image.height
            );
        }
    }
}

/// Sink that builds a browsable log: a `log.html` index in a fresh
/// directory plus sequentially numbered grayscale PNG snapshots.
pub struct HtmlSink {
    dir: PathBuf,
    html: BufWriter<File>,
    image_index: u32,
}

impl HtmlSink {
    /// Create the log directory (it must not exist yet) and open the index.
    pub fn create(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir(&dir)?;

        let mut html = BufWriter::new(File::create(dir.join("log.html"))?);
        writeln!(html, "<html>\n<body>")?;

        Ok(Self {
            dir,
            html,
            image_index: 0,
        })
    }

    fn write_png(&self, name: &str, image: &GrayImageView<'_>) -> Result<(), png::EncodingError> {
        let file = File::create(self.dir.join(name))?;
        let mut encoder =
            png::Encoder::new(BufWriter::new(file), image.width as u32, image.height as u32);
        encoder.set_color(png::ColorType::Grayscale);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(image.data)?;
        Ok(())
    }
}

impl DebugSink for HtmlSink {
    fn log(&mut self, text: Option<&str>, image: Option<&GrayImageView<'_>>) {
        let _ = writeln!(self.html, "<div>");

        if let Some(image) = image {
            let name = format!("{:06}.png", self.image_index);
            match self.write_png(&name, image) {
                Ok(()) => {
                    let _ = writeln!(self.html, "<img src='{name}' />");
                    self.image_index += 1;
                }
                Err(err) => log::warn!("html sink: failed to write {name}: {err}"),
            }
        }

        if let Some(text) = text {
            let _ = writeln!(self.html, "{text}");
        }

        let _ = writeln!(self.html, "</div>");
    }
}

impl Drop for HtmlSink {
    fn drop(&mut self) {
        let _ = writeln!(self.html, "</body>\n</html>");
        let _ = self.html.flush();
    }
}
