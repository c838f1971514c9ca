use rand::Rng;
use rand::seq::IndexedRandom;

const PROMPT_TYPES: &[&str] = &[
    "action photograph",
    "professional high angle landscape photograph",
    "90s fish eye photograph",
    "minimalist b&w mid-century geometric poster design",
    "chiaroscuro renaissance painting",
    "low poly render",
    "beautifully lit cubist sculpture",
    "action movie promotional photograph",
    "vintage horror movie poster",
    "80s educational infographic",
    "impressionist watercolor painting",
    "propaganda poster",
    "vintage advertisement",
    "vintage photograph",
    "security footage",
];

const PROMPT_SUBJECTS: &[&str] = &[
    "a rally car",
    "friendly monsters",
    "mist and smoke",
    "explosions",
    "an haute couture model",
    "a cute monkey",
    "an art director",
    "a cat",
    "palm trees",
    "important business people doing business",
    "a robot",
    "a hot air balloon",
    "a luxury watch",
    "a pair of sneakers",
    "an athlete",
    "an angry dragon",
    "a highly detailed spaceship",
];

const PROMPT_LOCATIONS: &[&str] = &[
    "paris fashion week",
    "a rainy amsterdam alley",
    "a museum of modern art",
    "mars",
    "a dimly lit cave",
    "a magical world",
    "a brutalist office lobby",
    "an abandoned building",
    "outer space",
    "the bottom of the ocean",
    "a moody forest",
    "a city",
    "a mountain landscape",
    "a creative studio office",
    "a dystopian future",
    "a cyberpunk city",
    "the high desert",
    "a tropical island",
    "a white studio backdrop",
];

/// Build a "{type} of {subject} at {location}" prompt for when the user gave none
pub fn random_prompt<R: Rng>(rng: &mut R) -> String {
    let kind = PROMPT_TYPES.choose(rng).copied().unwrap_or("photograph");
    let subject = PROMPT_SUBJECTS.choose(rng).copied().unwrap_or("a cat");
    let location = PROMPT_LOCATIONS.choose(rng).copied().unwrap_or("a city");
    format!("{kind} of {subject} at {location}")
}
