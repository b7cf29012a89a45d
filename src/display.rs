// Display egress: what the face shows, not how it is drawn

use tracing::info;

/// Images the 5x5 face can show
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Image {
    Zero = 0,
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Happy = 10,
    Sad = 11,
    Surprised = 12,
    Duck = 13,
    Check = 14,
    Clear = 15,
}

impl Image {
    const ALL: [Image; 16] = [
        Image::Zero,
        Image::One,
        Image::Two,
        Image::Three,
        Image::Four,
        Image::Five,
        Image::Six,
        Image::Seven,
        Image::Eight,
        Image::Nine,
        Image::Happy,
        Image::Sad,
        Image::Surprised,
        Image::Duck,
        Image::Check,
        Image::Clear,
    ];

    pub fn from_code(code: i32) -> Option<Image> {
        usize::try_from(code).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// The digit image for a player number; anything past nine shows blank
    pub fn digit(n: i32) -> Image {
        match n {
            0..=9 => Self::ALL[n as usize],
            _ => Image::Clear,
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red = 0,
    Green = 1,
    Blue = 2,
    Yellow = 3,
    Purple = 4,
    Orange = 5,
    Cyan = 6,
    White = 7,
}

impl Color {
    /// Map the `robotColor` setting onto a palette entry, Red when out of range
    pub fn from_setting(value: f32) -> Color {
        match value as i32 {
            1 => Color::Green,
            2 => Color::Blue,
            3 => Color::Yellow,
            4 => Color::Purple,
            5 => Color::Orange,
            6 => Color::Cyan,
            7 => Color::White,
            _ => Color::Red,
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Color::Red => (255, 0, 0),
            Color::Green => (0, 255, 0),
            Color::Blue => (0, 0, 255),
            Color::Yellow => (255, 128, 0),
            Color::Purple => (255, 0, 196),
            Color::Orange => (255, 96, 0),
            Color::Cyan => (0, 196, 255),
            Color::White => (144, 144, 128),
        }
    }
}

/// Anything that can put an image on the robot's face
pub trait Display: Send {
    fn show(&mut self, image: Image, color: Color);
}

/// Display that only logs what it would draw
#[derive(Debug, Default)]
pub struct LogDisplay;

impl Display for LogDisplay {
    fn show(&mut self, image: Image, color: Color) {
        let (r, g, b) = color.rgb();
        info!("Display: {:?} in {:?} (#{:02x}{:02x}{:02x})", image, color, r, g, b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_codes() {
        assert_eq!(Image::from_code(0), Some(Image::Zero));
        assert_eq!(Image::from_code(13), Some(Image::Duck));
        assert_eq!(Image::from_code(15), Some(Image::Clear));
        assert_eq!(Image::from_code(16), None);
        assert_eq!(Image::from_code(-1), None);
    }

    #[test]
    fn test_digits() {
        assert_eq!(Image::digit(3), Image::Three);
        assert_eq!(Image::digit(12), Image::Clear);
    }

    #[test]
    fn test_color_from_setting_truncates() {
        assert_eq!(Color::from_setting(2.0), Color::Blue);
        assert_eq!(Color::from_setting(6.9), Color::Cyan);
        assert_eq!(Color::from_setting(42.0), Color::Red);
    }
}
