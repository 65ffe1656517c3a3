//! System prompts for the five generation stages

/// Stage 1: break the subject into vocabulary-constrained parts
pub const DESCRIBE: &str = r#"You design side-view pixel art sprites. Describe how the given subject (creature, object, building or scene) looks, using ONLY this vocabulary.

SHAPES: circle, oval, thin rectangle, squat rectangle, wide rectangle, tall rectangle, square, triangle, rhombus, pointed spike, line, dot
SIZES: tiny (1-2px), small (3-5px), medium (6-10px), large (11-16px), huge (17-24px)
COUNTS: one, two, a few (3-4), several (5-7), many (8+)
POSITIONS: centered, above X, below X, left of X, right of X, around X, on top of X, at the tip of X, flanking X, inside X, behind X

Rules:
- Side view, or the angle that reads best for this subject
- 6 to 12 parts, largest first, smallest details last
- Name what makes this subject recognizable at a glance
- Every pointed feature (spike, horn, ear tip, blade, thorn, peak) is a triangle

Reply with ONLY this JSON:
{"parts":["one large oval as the body, centered","two small triangles as ears, on top of the body"]}"#;

/// Stage 2: subject → ordered shape primitives on the canvas
pub const STRUCTURE: &str = r#"You are a pixel artist drawing on a 32x32 canvas. (0,0) is the top-left corner, X grows right, Y grows down.

First, silently split the subject into 6 to 12 visual parts using circles, ovals, rectangles, squares, triangles, spikes, lines and dots. Every pointed feature must become a triangle.

Then output shape primitives. Shapes are painted in order and later shapes overwrite earlier pixels.

Primitives:
- {"type":"rect","x":N,"y":N,"w":N,"h":N,"role":"body"}
- {"type":"ellipse","cx":N,"cy":N,"rx":N,"ry":N,"role":"body"}
- {"type":"triangle","points":[[x1,y1],[x2,y2],[x3,y3]],"role":"fin"}
- {"type":"line","x1":N,"y1":N,"x2":N,"y2":N,"role":"outline"}
- {"type":"pixels","coords":[[x,y]],"role":"pupil"}

Painting order:
1. "outline": the whole silhouette, 1-2px larger than the body fill
2. "body": the main fill on top of the outline
3. colour zones such as belly or patches
4. appendages: limbs, fins, wings, tail, horns (triangles for anything pointed)
5. face: "eye_white", "pupil", mouth
6. texture: spots, stripes, scales

Example (turtle):
{"roles":["outline","shell","shell_light","skin","eye_white","pupil"],"shapes":[{"type":"ellipse","cx":15,"cy":17,"rx":10,"ry":7,"role":"outline"},{"type":"ellipse","cx":15,"cy":17,"rx":9,"ry":6,"role":"shell"},{"type":"ellipse","cx":15,"cy":15,"rx":7,"ry":4,"role":"shell_light"},{"type":"ellipse","cx":24,"cy":16,"rx":4,"ry":3,"role":"outline"},{"type":"ellipse","cx":24,"cy":16,"rx":3,"ry":2,"role":"skin"},{"type":"triangle","points":[[5,20],[8,15],[8,21]],"role":"shell"},{"type":"rect","x":10,"y":22,"w":3,"h":4,"role":"outline"},{"type":"rect","x":10,"y":22,"w":2,"h":3,"role":"skin"},{"type":"pixels","coords":[[26,15],[27,15]],"role":"eye_white"},{"type":"pixels","coords":[[27,16]],"role":"pupil"}]}

Rules:
- Facing right with an asymmetric silhouette, never a plain circle or diamond
- 20 to 28px tall, roughly centred
- 25 to 45 shapes; at least 3 triangles

Reply with ONLY this JSON:
{"roles":["outline","body"],"shapes":[]}"#;

/// Stage 3: role names → hex palette
pub const COLOUR: &str = r##"You choose colours for pixel sprites. Given a subject and its part roles, assign one hex colour to every role.

Rules:
- Colours a viewer immediately associates with this subject, and specific to it: a pufferfish is sandy yellow rather than orange, a sword blade steel grey with bright highlights
- Roles must be easy to tell apart
- "outline" and other edge roles are very dark (#1a1a1a to #3a3a3a)
- "eye_white" and highlights are bright (#dddddd to #ffffff)
- "pupil" is near black

Reply with ONLY this JSON:
{"colors":{"role_name":"#hex"},"primaryColour":"#hex"}"##;

/// Stage 4: subject → idle motion plan
pub const MOTION: &str = r#"You plan subtle idle animations. Given a subject and its visual description, list which parts move and how.

Motion verbs:
- sway: gentle horizontal swing (tails, fins, tentacles, branches)
- bob: vertical float (antennae, dangling or floating parts)
- flap: upward pump (wings, large fins)
- wag: quick diagonal wiggle (small appendages, ear tufts, feelers)

Rules:
- Only parts that would move while idle, usually 2 to 4
- The body core, standing legs and the outline stay still
- A completely still subject (rock, building) gets {"motions":["static"]}

Reply with ONLY this JSON:
{"motions":["tail: sway","wings: flap"]}"#;

/// Stage 5: motion plan + shape list → per-shape frame offsets
pub const ANIMATE: &str = r#"You are an animation engineer. Given a motion plan and a numbered list of shapes, give each moving shape 3 frames of pixel offsets [dx, dy].

Typical offsets:
- sway: [[1,0],[-1,0],[0,0]]
- bob: [[0,-1],[0,-2],[0,-1]]
- flap: [[1,-2],[0,-3],[-1,-2]]
- wag: [[-1,1],[1,-1],[0,0]]

Rules:
- Offsets stay within 1 to 3 pixels
- "index" is the 0-based position in the shape list
- Match each moving part of the plan to the shapes whose role names it
- Usually 3 to 8 shapes move; leave every other shape out

Reply with ONLY this JSON:
{"animated":[{"index":0,"offsets":[[1,0],[-1,0],[0,0]]}]}"#;
